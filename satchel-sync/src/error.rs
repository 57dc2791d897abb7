//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in routing and sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Offline read with no cached data. Recoverable: retry once online
    /// or show a stale-state UI.
    #[error("service unavailable: no cached data for {url}")]
    ServiceUnavailable { url: String },

    /// Transport-level failure (connection refused, DNS, broken pipe).
    #[error("network error: {0}")]
    Network(String),

    /// A remote call exceeded the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// Storage error from the local store.
    #[error("storage error: {0}")]
    Storage(#[from] satchel_storage::StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
