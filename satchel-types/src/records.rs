//! Durable record envelopes for the outbox, conflict log, and cache.
//!
//! These are the rows the local store persists. A `PendingMutation` is
//! immutable once queued: it is either removed after a successful replay
//! or relocated, payload intact, into the conflict log.

use crate::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A mutation attempted while offline, awaiting replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    /// Store-assigned monotonic sequence key.
    pub id: i64,
    /// Target URL.
    pub url: String,
    /// HTTP method (POST, PUT or DELETE).
    pub method: Method,
    /// Opaque JSON payload.
    pub payload: Value,
    /// When the mutation was queued. Replay order is FIFO by this field,
    /// ties broken by `id`.
    pub enqueued_at: DateTime<Utc>,
}

/// A mutation the backend rejected as invalid during replay.
///
/// Conflicts are never retried or deleted automatically; removal is an
/// explicit operator action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Store-assigned sequence key (independent of the originating
    /// mutation's key).
    pub id: i64,
    /// Target URL, copied from the originating mutation.
    pub url: String,
    /// HTTP method, copied from the originating mutation.
    pub method: Method,
    /// Opaque JSON payload, copied from the originating mutation.
    pub payload: Value,
    /// Original enqueue time, copied from the originating mutation.
    pub enqueued_at: DateTime<Utc>,
    /// Description of the backend's rejection.
    pub error: String,
}

/// Last-known-good response body for a read, keyed by request URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Canonical request URL.
    pub key: String,
    /// Cached response body.
    pub data: Value,
    /// When the entry was written. No expiry; staleness tolerance is the
    /// caller's call.
    pub stored_at: DateTime<Utc>,
}
