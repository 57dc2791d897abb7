//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing database cannot be opened or upgraded. Fatal to all
    /// operations until resolved.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A required collection is missing after a schema upgrade. Fatal;
    /// requires a manual reset.
    #[error("schema corrupt: {0}")]
    SchemaCorrupt(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be decoded.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
