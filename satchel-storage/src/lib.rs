//! SQLite storage layer for Satchel.
//!
//! Provides the durable local store backing the offline-first engine:
//! four collections (pending-mutation outbox, conflict log, response
//! cache, session notes) in one SQLite file.
//!
//! # Architecture
//!
//! - The outbox and conflict log are append-ordered, keyed by a
//!   store-assigned monotonic rowid; listing is FIFO by enqueue time with
//!   insertion-order tie-break
//! - The cache and note collections are keyed upserts (last write wins)
//! - Schema migrations are additive and run automatically on open; a
//!   missing collection after migration fails open with `SchemaCorrupt`
//! - First open seeds example session notes, best effort

mod error;
mod store;

pub use error::{StorageError, StorageResult};
pub use store::{Collection, LocalStore, SCHEMA_VERSION};
