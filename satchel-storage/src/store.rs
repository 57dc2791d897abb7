//! The local store: four durable collections in one SQLite file.
//!
//! A `Connection` behind an `Arc<Mutex<_>>`, schema migrated on open,
//! typed save/load/remove methods per collection.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use satchel_types::{CacheEntry, Conflict, Method, PendingMutation, SessionNote};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Current schema version. Bump when adding a migration step.
pub const SCHEMA_VERSION: i64 = 2;

/// The four durable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Outbox of mutations awaiting replay.
    PendingMutations,
    /// Mutations rejected by the backend, parked for manual resolution.
    Conflicts,
    /// Last-known-good read responses, keyed by URL.
    CacheEntries,
    /// Example domain records.
    SessionNotes,
}

impl Collection {
    fn table(&self) -> &'static str {
        match self {
            Collection::PendingMutations => "pending_mutations",
            Collection::Conflicts => "conflicts",
            Collection::CacheEntries => "cache_entries",
            Collection::SessionNotes => "session_notes",
        }
    }
}

/// Durable, indexed store for the offline-first engine.
///
/// All mutation goes through this type; moving an outbox row into the
/// conflict log happens inside a single SQL transaction so no observer
/// can see the row in both collections or in neither.
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Opens (or creates) a store at the given path, running any pending
    /// schema migrations and seeding example data on first open.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StorageError::Unavailable(format!("failed to open store: {e}")))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Unavailable(format!("failed to open in-memory store: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        store.verify_schema()?;
        if let Err(e) = store.seed_notes() {
            warn!("failed to seed example notes (continuing): {e}");
        }
        Ok(store)
    }

    // ── Schema ───────────────────────────────────────────────────

    /// Runs additive migrations up to [`SCHEMA_VERSION`]. Never drops
    /// tables or rows; opening a newer file with older code is the only
    /// unsupported direction.
    fn migrate(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| StorageError::Unavailable(format!("failed to read schema version: {e}")))?;

        if version >= SCHEMA_VERSION {
            return Ok(());
        }
        info!("migrating store schema from v{version} to v{SCHEMA_VERSION}");

        if version < 1 {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS pending_mutations (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    url TEXT NOT NULL,
                    method TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    enqueued_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_pending_enqueued_at
                    ON pending_mutations (enqueued_at, id);

                CREATE TABLE IF NOT EXISTS cache_entries (
                    key TEXT PRIMARY KEY,
                    data TEXT NOT NULL,
                    stored_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS session_notes (
                    id TEXT PRIMARY KEY,
                    payload TEXT NOT NULL,
                    timestamp TEXT NOT NULL,
                    shift_date TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_notes_shift_date
                    ON session_notes (shift_date);
                ",
            )
            .map_err(|e| StorageError::Unavailable(format!("schema v1 migration failed: {e}")))?;
        }

        if version < 2 {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS conflicts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    url TEXT NOT NULL,
                    method TEXT NOT NULL,
                    payload TEXT NOT NULL,
                    enqueued_at TEXT NOT NULL,
                    error TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_conflicts_enqueued_at
                    ON conflicts (enqueued_at, id);
                ",
            )
            .map_err(|e| StorageError::Unavailable(format!("schema v2 migration failed: {e}")))?;
        }

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| StorageError::Unavailable(format!("failed to set schema version: {e}")))?;
        Ok(())
    }

    /// Confirms every collection exists after migration. A missing table
    /// here means the file is beyond additive repair.
    fn verify_schema(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        for collection in [
            Collection::PendingMutations,
            Collection::Conflicts,
            Collection::CacheEntries,
            Collection::SessionNotes,
        ] {
            let present: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![collection.table()],
                    |row| row.get::<_, i64>(0),
                )
                .map(|n| n > 0)
                .map_err(|e| StorageError::Unavailable(format!("schema check failed: {e}")))?;
            if !present {
                return Err(StorageError::SchemaCorrupt(format!(
                    "collection '{}' missing after migration",
                    collection.table()
                )));
            }
        }
        Ok(())
    }

    /// Seeds example session notes on first open. Keyed on emptiness, so
    /// reopening (or racing openers on the same file) never duplicates
    /// rows. Best effort: the store is fully usable without seed data.
    fn seed_notes(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM session_notes", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let seeds = example_notes();
        for note in &seeds {
            let payload = serde_json::to_string(note)?;
            conn.execute(
                "INSERT OR IGNORE INTO session_notes (id, payload, timestamp, shift_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    note.id,
                    payload,
                    encode_ts(&note.timestamp),
                    note.shift_date
                ],
            )?;
        }
        debug!("seeded {} example session notes", seeds.len());
        Ok(())
    }

    // ── Pending mutations (outbox) ───────────────────────────────

    /// Appends a mutation to the outbox and returns the stored record
    /// with its assigned sequence key.
    pub fn enqueue_mutation(
        &self,
        url: &str,
        method: Method,
        payload: Value,
    ) -> StorageResult<PendingMutation> {
        let enqueued_at = now_micros();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO pending_mutations (url, method, payload, enqueued_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                url,
                method.to_string(),
                serde_json::to_string(&payload)?,
                encode_ts(&enqueued_at)
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(PendingMutation {
            id,
            url: url.to_string(),
            method,
            payload,
            enqueued_at,
        })
    }

    /// Lists the outbox in replay order: FIFO by enqueue time, ties by
    /// insertion order.
    pub fn list_pending(&self) -> StorageResult<Vec<PendingMutation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, url, method, payload, enqueued_at FROM pending_mutations
             ORDER BY enqueued_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, url, method, payload, enqueued_at) = row?;
            result.push(PendingMutation {
                id,
                url,
                method: decode_method(&method)?,
                payload: serde_json::from_str(&payload)?,
                enqueued_at: decode_ts(&enqueued_at)?,
            });
        }
        Ok(result)
    }

    /// Fetches a single outbox row by key.
    pub fn get_pending(&self, id: i64) -> StorageResult<Option<PendingMutation>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT url, method, payload, enqueued_at FROM pending_mutations WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((url, method, payload, enqueued_at)) => Ok(Some(PendingMutation {
                id,
                url,
                method: decode_method(&method)?,
                payload: serde_json::from_str(&payload)?,
                enqueued_at: decode_ts(&enqueued_at)?,
            })),
            None => Ok(None),
        }
    }

    /// Removes an outbox row. Removing an absent key is not an error.
    pub fn remove_pending(&self, id: i64) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM pending_mutations WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Number of queued mutations.
    pub fn pending_count(&self) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pending_mutations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Relocates an outbox row into the conflict log, attaching the
    /// rejection description. Runs as one transaction: a concurrent
    /// reader sees the row in exactly one of the two collections.
    ///
    /// Returns `false` (and does nothing) when the key is absent.
    pub fn move_to_conflict(&self, id: i64, error: &str) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let row = tx
            .query_row(
                "SELECT url, method, payload, enqueued_at FROM pending_mutations WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((url, method, payload, enqueued_at)) = row else {
            return Ok(false);
        };

        tx.execute(
            "INSERT INTO conflicts (url, method, payload, enqueued_at, error)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![url, method, payload, enqueued_at, error],
        )?;
        tx.execute("DELETE FROM pending_mutations WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(true)
    }

    // ── Conflict log ─────────────────────────────────────────────

    /// Lists the conflict log ordered by original enqueue time, ties by
    /// insertion order.
    pub fn list_conflicts(&self) -> StorageResult<Vec<Conflict>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, url, method, payload, enqueued_at, error FROM conflicts
             ORDER BY enqueued_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, url, method, payload, enqueued_at, error) = row?;
            result.push(Conflict {
                id,
                url,
                method: decode_method(&method)?,
                payload: serde_json::from_str(&payload)?,
                enqueued_at: decode_ts(&enqueued_at)?,
                error,
            });
        }
        Ok(result)
    }

    /// Fetches a single conflict by key.
    pub fn get_conflict(&self, id: i64) -> StorageResult<Option<Conflict>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT url, method, payload, enqueued_at, error FROM conflicts WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((url, method, payload, enqueued_at, error)) => Ok(Some(Conflict {
                id,
                url,
                method: decode_method(&method)?,
                payload: serde_json::from_str(&payload)?,
                enqueued_at: decode_ts(&enqueued_at)?,
                error,
            })),
            None => Ok(None),
        }
    }

    /// Removes a conflict (operator action). Idempotent.
    pub fn remove_conflict(&self, id: i64) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM conflicts WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Response cache ───────────────────────────────────────────

    /// Writes (or overwrites) a cache entry. Last write wins.
    pub fn put_cache(&self, key: &str, data: &Value) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, data, stored_at) VALUES (?1, ?2, ?3)",
            params![key, serde_json::to_string(data)?, encode_ts(&now_micros())],
        )?;
        Ok(())
    }

    /// Looks up a cache entry by request URL.
    pub fn get_cache(&self, key: &str) -> StorageResult<Option<CacheEntry>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT data, stored_at FROM cache_entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((data, stored_at)) => Ok(Some(CacheEntry {
                key: key.to_string(),
                data: serde_json::from_str(&data)?,
                stored_at: decode_ts(&stored_at)?,
            })),
            None => Ok(None),
        }
    }

    // ── Session notes ────────────────────────────────────────────

    /// Upserts a note by primary key.
    pub fn put_note(&self, note: &SessionNote) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO session_notes (id, payload, timestamp, shift_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                note.id,
                serde_json::to_string(note)?,
                encode_ts(&note.timestamp),
                note.shift_date
            ],
        )?;
        Ok(())
    }

    /// Fetches a note by id.
    pub fn get_note(&self, id: &str) -> StorageResult<Option<SessionNote>> {
        let conn = self.conn.lock().unwrap();
        let payload = conn
            .query_row(
                "SELECT payload FROM session_notes WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Lists notes ordered by shift date, ties by insertion order.
    pub fn list_notes(&self) -> StorageResult<Vec<SessionNote>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT payload FROM session_notes ORDER BY shift_date, rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for payload in rows {
            result.push(serde_json::from_str(&payload?)?);
        }
        Ok(result)
    }

    /// Deletes a note. Idempotent.
    pub fn delete_note(&self, id: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM session_notes WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Wholesale ────────────────────────────────────────────────

    /// Clears an entire collection.
    pub fn clear(&self, collection: Collection) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(&format!("DELETE FROM {}", collection.table()), [])?;
        Ok(())
    }
}

/// Current time truncated to microseconds, the precision the store
/// persists. Keeps in-memory records equal to their stored form.
fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

fn encode_ts(ts: &DateTime<Utc>) -> String {
    // Fixed-width RFC 3339 so text ordering matches time ordering.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp '{s}': {e}")))
}

fn decode_method(s: &str) -> StorageResult<Method> {
    Method::from_str(s).map_err(|e| StorageError::InvalidData(e.to_string()))
}

/// Fixed example data for first-run seeding.
fn example_notes() -> Vec<SessionNote> {
    let mk = |id: &str, patient: &str, note: &str, shift_date: &str| SessionNote {
        id: id.to_string(),
        patient: patient.to_string(),
        note: note.to_string(),
        author: "demo".to_string(),
        timestamp: Utc::now(),
        shift_date: shift_date.to_string(),
    };
    vec![
        mk(
            "seed-note-1",
            "A. Morgan",
            "Morning check-in, vitals stable.",
            "2026-01-05",
        ),
        mk(
            "seed-note-2",
            "A. Morgan",
            "Evening session, discussed care plan.",
            "2026-01-05",
        ),
        mk(
            "seed-note-3",
            "J. Rivera",
            "Intake session completed.",
            "2026-01-06",
        ),
    ]
}
