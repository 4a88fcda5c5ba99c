//! SQL schema for the iwant SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Results are never deleted outside of a wipe; AUTOINCREMENT keeps ids from
-- being reused even after the rows are gone.
CREATE TABLE IF NOT EXISTS results (
    result_id INTEGER PRIMARY KEY AUTOINCREMENT,
    deadline  TEXT NOT NULL,   -- RFC 3339 UTC, fixed width; stale when invalid
    status    TEXT NOT NULL CHECK (status IN ('pending', 'fresh', 'invalid'))
);

CREATE TABLE IF NOT EXISTS requests (
    request_id     TEXT PRIMARY KEY,
    person_id      TEXT NOT NULL,
    activity       TEXT NOT NULL,
    deadline       TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    created_at     TEXT NOT NULL,
    window_seconds INTEGER NOT NULL CHECK (window_seconds >= 0),
    resolved_by    INTEGER NOT NULL REFERENCES results(result_id)
);

CREATE INDEX IF NOT EXISTS requests_activity_idx    ON requests(activity);
CREATE INDEX IF NOT EXISTS requests_deadline_idx    ON requests(deadline);
CREATE INDEX IF NOT EXISTS requests_resolved_by_idx ON requests(resolved_by);

PRAGMA user_version = 1;
";

/// Drops every row; the `sqlite_sequence` counters are left alone.
pub const WIPE: &str = "
DELETE FROM requests;
DELETE FROM results;
";
