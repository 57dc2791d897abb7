//! Example domain record: a session note.
//!
//! The engine is agnostic to domain shapes beyond a stable `id`; this type
//! exists for the seeded example data and the integration tests. Real
//! deployments store their own records through the same request path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note taken during a care session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNote {
    /// Stable identifier.
    pub id: String,
    /// Who the session was with.
    pub patient: String,
    /// Free-text note body.
    pub note: String,
    /// Author of the note.
    pub author: String,
    /// When the note was written.
    pub timestamp: DateTime<Utc>,
    /// Shift the note belongs to (partition key, `YYYY-MM-DD`).
    pub shift_date: String,
}

impl SessionNote {
    /// Creates a new note with a generated time-ordered id.
    pub fn new(
        patient: impl Into<String>,
        note: impl Into<String>,
        author: impl Into<String>,
        shift_date: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            patient: patient.into(),
            note: note.into(),
            author: author.into(),
            timestamp: now,
            shift_date: shift_date.into(),
        }
    }
}
