//! SQL schema for the snapshot store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per saved store snapshot; the newest row wins on load.
CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    saved_at         TEXT    NOT NULL,   -- RFC 3339 UTC
    active_pk        TEXT,
    annotation_count INTEGER NOT NULL
);

-- Raw annotation JSON, in allPKs order.
CREATE TABLE IF NOT EXISTS snapshot_annotations (
    snapshot_id     INTEGER NOT NULL REFERENCES snapshots(snapshot_id) ON DELETE CASCADE,
    position        INTEGER NOT NULL,
    annotation_pk   TEXT,
    annotation_json TEXT    NOT NULL,
    PRIMARY KEY (snapshot_id, position)
);

PRAGMA user_version = 1;
";
