//! Core type definitions for Satchel.
//!
//! This crate defines the fundamental, domain-agnostic types used throughout
//! the sync engine:
//! - HTTP-shaped request/response types and their status classification
//! - Outbox records (pending mutations, conflicts) and cache entries
//! - The example session-note domain record
//!
//! The engine treats domain payloads as opaque JSON; only the record
//! envelopes defined here carry meaning for routing and sync.

mod note;
mod records;
mod request;

pub use note::SessionNote;
pub use records::{CacheEntry, Conflict, PendingMutation};
pub use request::{ClientResponse, Method, RemoteRequest, RemoteResponse, ResponseSource};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
}
