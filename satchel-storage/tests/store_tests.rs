use pretty_assertions::assert_eq;
use satchel_storage::{Collection, LocalStore, SCHEMA_VERSION, StorageError};
use satchel_types::{Method, SessionNote};
use serde_json::json;
use tempfile::TempDir;

fn store() -> LocalStore {
    LocalStore::open_in_memory().unwrap()
}

// ── Outbox ───────────────────────────────────────────────────────

#[test]
fn enqueue_assigns_monotonic_keys() {
    let store = store();
    let a = store
        .enqueue_mutation("/api/a", Method::Post, json!({"n": 1}))
        .unwrap();
    let b = store
        .enqueue_mutation("/api/b", Method::Put, json!({"n": 2}))
        .unwrap();
    let c = store
        .enqueue_mutation("/api/c", Method::Delete, json!(null))
        .unwrap();

    assert!(a.id < b.id);
    assert!(b.id < c.id);
}

#[test]
fn list_pending_is_fifo() {
    let store = store();
    for i in 0..5 {
        store
            .enqueue_mutation(&format!("/api/item/{i}"), Method::Post, json!({"i": i}))
            .unwrap();
    }

    let pending = store.list_pending().unwrap();
    assert_eq!(pending.len(), 5);
    for (i, item) in pending.iter().enumerate() {
        assert_eq!(item.url, format!("/api/item/{i}"));
        assert_eq!(item.payload, json!({"i": i}));
    }
    // Enqueue times never decrease and ids break ties by insertion order.
    for pair in pending.windows(2) {
        assert!(pair[0].enqueued_at <= pair[1].enqueued_at);
        assert!(pair[0].id < pair[1].id);
    }
}

#[test]
fn get_pending_round_trips() {
    let store = store();
    let queued = store
        .enqueue_mutation("/api/session-notes/1", Method::Put, json!({"note": "x"}))
        .unwrap();

    let fetched = store.get_pending(queued.id).unwrap().unwrap();
    assert_eq!(fetched, queued);
    assert!(store.get_pending(queued.id + 100).unwrap().is_none());
}

#[test]
fn remove_pending_is_idempotent() {
    let store = store();
    let queued = store
        .enqueue_mutation("/api/x", Method::Post, json!({}))
        .unwrap();

    store.remove_pending(queued.id).unwrap();
    store.remove_pending(queued.id).unwrap(); // absent key is not an error
    assert_eq!(store.pending_count().unwrap(), 0);
}

// ── Queue → conflict relocation ──────────────────────────────────

#[test]
fn move_to_conflict_relocates_exactly_once() {
    let store = store();
    let queued = store
        .enqueue_mutation("/api/session-notes/9", Method::Put, json!({"note": "bad"}))
        .unwrap();

    let moved = store.move_to_conflict(queued.id, "rejected with status 422").unwrap();
    assert!(moved);

    // In the conflict log exactly once, absent from the queue.
    assert_eq!(store.pending_count().unwrap(), 0);
    let conflicts = store.list_conflicts().unwrap();
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.url, queued.url);
    assert_eq!(conflict.method, queued.method);
    assert_eq!(conflict.payload, queued.payload);
    assert_eq!(conflict.enqueued_at, queued.enqueued_at);
    assert_eq!(conflict.error, "rejected with status 422");

    let fetched = store.get_conflict(conflict.id).unwrap().unwrap();
    assert_eq!(&fetched, conflict);
}

#[test]
fn move_to_conflict_on_absent_key_is_noop() {
    let store = store();
    assert!(!store.move_to_conflict(42, "whatever").unwrap());
    assert!(store.list_conflicts().unwrap().is_empty());
}

#[test]
fn remove_conflict_is_idempotent() {
    let store = store();
    let queued = store
        .enqueue_mutation("/api/x", Method::Delete, json!(null))
        .unwrap();
    store.move_to_conflict(queued.id, "no").unwrap();

    let id = store.list_conflicts().unwrap()[0].id;
    store.remove_conflict(id).unwrap();
    store.remove_conflict(id).unwrap();
    assert!(store.list_conflicts().unwrap().is_empty());
}

// ── Response cache ───────────────────────────────────────────────

#[test]
fn cache_round_trips() {
    let store = store();
    store
        .put_cache("/api/session-notes", &json!([{"id": "1"}]))
        .unwrap();

    let entry = store.get_cache("/api/session-notes").unwrap().unwrap();
    assert_eq!(entry.key, "/api/session-notes");
    assert_eq!(entry.data, json!([{"id": "1"}]));
}

#[test]
fn cache_is_last_write_wins() {
    let store = store();
    store.put_cache("/api/k", &json!({"v": 1})).unwrap();
    store.put_cache("/api/k", &json!({"v": 2})).unwrap();

    let entry = store.get_cache("/api/k").unwrap().unwrap();
    assert_eq!(entry.data, json!({"v": 2}));
}

#[test]
fn cache_miss_is_none() {
    let store = store();
    assert!(store.get_cache("/api/unknown").unwrap().is_none());
}

#[test]
fn clear_cache_wholesale() {
    let store = store();
    store.put_cache("/a", &json!(1)).unwrap();
    store.put_cache("/b", &json!(2)).unwrap();

    store.clear(Collection::CacheEntries).unwrap();
    assert!(store.get_cache("/a").unwrap().is_none());
    assert!(store.get_cache("/b").unwrap().is_none());
}

// ── Session notes ────────────────────────────────────────────────

#[test]
fn seeds_example_notes_on_first_open() {
    let store = store();
    let notes = store.list_notes().unwrap();
    assert!(!notes.is_empty());
}

#[test]
fn seeding_does_not_duplicate_across_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("satchel.db");

    let first = LocalStore::open(&path).unwrap();
    let seeded = first.list_notes().unwrap().len();
    drop(first);

    let second = LocalStore::open(&path).unwrap();
    assert_eq!(second.list_notes().unwrap().len(), seeded);
}

#[test]
fn notes_upsert_and_delete() {
    let store = store();
    store.clear(Collection::SessionNotes).unwrap();

    let mut note = SessionNote::new("A. Morgan", "first draft", "demo", "2026-02-01");
    store.put_note(&note).unwrap();

    note.note = "revised".to_string();
    store.put_note(&note).unwrap();

    let fetched = store.get_note(&note.id).unwrap().unwrap();
    assert_eq!(fetched.note, "revised");
    assert_eq!(store.list_notes().unwrap().len(), 1);

    store.delete_note(&note.id).unwrap();
    store.delete_note(&note.id).unwrap(); // idempotent
    assert!(store.get_note(&note.id).unwrap().is_none());
}

#[test]
fn notes_list_ordered_by_shift_date() {
    let store = store();
    store.clear(Collection::SessionNotes).unwrap();

    store
        .put_note(&SessionNote::new("B", "late shift", "demo", "2026-02-03"))
        .unwrap();
    store
        .put_note(&SessionNote::new("A", "early shift", "demo", "2026-02-01"))
        .unwrap();
    store
        .put_note(&SessionNote::new("C", "also early", "demo", "2026-02-01"))
        .unwrap();

    let notes = store.list_notes().unwrap();
    let shifts: Vec<&str> = notes.iter().map(|n| n.shift_date.as_str()).collect();
    assert_eq!(shifts, vec!["2026-02-01", "2026-02-01", "2026-02-03"]);
    // Same shift date: insertion order is preserved.
    assert_eq!(notes[0].patient, "A");
    assert_eq!(notes[1].patient, "C");
}

// ── Schema lifecycle ─────────────────────────────────────────────

#[test]
fn migrates_v1_layout_without_losing_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("old.db");

    // Build a v1-era file: no conflicts table yet, one queued mutation.
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "
            CREATE TABLE pending_mutations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                method TEXT NOT NULL,
                payload TEXT NOT NULL,
                enqueued_at TEXT NOT NULL
            );
            CREATE TABLE cache_entries (
                key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );
            CREATE TABLE session_notes (
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                shift_date TEXT NOT NULL
            );
            INSERT INTO pending_mutations (url, method, payload, enqueued_at)
            VALUES ('/api/x', 'POST', '{}', '2026-01-01T00:00:00.000000Z');
            PRAGMA user_version = 1;
            ",
        )
        .unwrap();
    }

    let store = LocalStore::open(&path).unwrap();
    // Existing data survives and the missing collection was added.
    assert_eq!(store.pending_count().unwrap(), 1);
    assert!(store.list_conflicts().unwrap().is_empty());
}

#[test]
fn missing_collection_after_upgrade_is_schema_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.db");

    // Claims to be fully migrated but has no tables at all.
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION).unwrap();
    }

    let err = LocalStore::open(&path).map(|_| ()).unwrap_err();
    assert!(matches!(err, StorageError::SchemaCorrupt(_)), "got {err}");
}

#[test]
fn reopen_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("satchel.db");

    let first = LocalStore::open(&path).unwrap();
    first
        .enqueue_mutation("/api/x", Method::Post, json!({"keep": true}))
        .unwrap();
    drop(first);

    let second = LocalStore::open(&path).unwrap();
    let pending = second.list_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload, json!({"keep": true}));
}
