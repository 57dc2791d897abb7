//! Offline-first request routing and sync engine for Satchel.
//!
//! Lets an application keep working while disconnected from its backend,
//! then reconcile automatically once connectivity returns.
//!
//! # Architecture
//!
//! - **Connectivity**: single source of truth for reachability, with a
//!   deduplicated transition stream
//! - **Router**: per-request policy — forward, serve from cache, or queue
//!   to the durable outbox with an optimistic reply
//! - **Transport**: abstracts the HTTP-shaped backend contract
//! - **Orchestrator**: drains the outbox in strict FIFO order on
//!   reconnect, relocating rejected mutations into the conflict log
//!
//! # Delivery semantics
//!
//! At-least-once. A drain stops on the first transient failure and
//! resumes from the same item on the next reconnect, so the backend (or
//! caller) is responsible for idempotency. Mutations rejected with a 4xx
//! are never retried automatically; they park in the conflict log until
//! an operator removes them.
//!
//! # Example
//!
//! ```
//! use satchel_sync::{Satchel, SatchelConfig, transport::mock::MockTransport};
//! use satchel_types::Method;
//! use std::sync::Arc;
//!
//! # async fn demo() -> satchel_sync::SyncResult<()> {
//! let config = SatchelConfig::new("/tmp/satchel.db");
//! let satchel = Satchel::open(config, Arc::new(MockTransport::new())).await?;
//!
//! satchel.set_online(false);
//! let reply = satchel
//!     .submit_request(Method::Put, "/api/session-notes/1", Some(serde_json::json!({"note": "x"})))
//!     .await?;
//! assert_eq!(reply.status, 200);
//!
//! satchel.set_online(true); // auto-drain replays the queued PUT
//! # Ok(())
//! # }
//! ```

mod connectivity;
mod error;
pub mod http;
mod orchestrator;
mod router;
mod satchel;
pub mod transport;

pub use connectivity::ConnectivityMonitor;
pub use error::{SyncError, SyncResult};
pub use http::{HttpConfig, HttpTransport};
pub use orchestrator::{DrainOutcome, SyncConfig, SyncOrchestrator, SyncStatus};
pub use router::RequestRouter;
pub use satchel::{Satchel, SatchelConfig, StoreCell};
pub use transport::RemoteTransport;
