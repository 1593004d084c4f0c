//! [`SqliteSnapshotStore`], the SQLite implementation of [`SnapshotStore`].

use std::path::Path;

use curation_core::{Snapshot, SnapshotStore};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use crate::{
  Result,
  encode::{RawSnapshot, decode_dt, encode_annotations, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A snapshot history kept in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSnapshotStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSnapshotStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of snapshots currently kept.
  pub async fn snapshot_count(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM snapshots", [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }

  /// Delete all but the `keep` most recent snapshots. Returns how many were
  /// removed.
  pub async fn prune(&self, keep: usize) -> Result<usize> {
    let keep = i64::try_from(keep).unwrap_or(i64::MAX);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM snapshots WHERE snapshot_id NOT IN (
             SELECT snapshot_id FROM snapshots ORDER BY snapshot_id DESC LIMIT ?1
           )",
          rusqlite::params![keep],
        )?)
      })
      .await?;
    debug!(removed, "pruned snapshots");
    Ok(removed)
  }

  /// When the newest snapshot was saved.
  pub async fn latest_saved_at(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    let saved_at: Option<String> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT saved_at FROM snapshots ORDER BY snapshot_id DESC LIMIT 1",
              [],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    saved_at.as_deref().map(decode_dt).transpose()
  }
}

// ─── SnapshotStore impl ──────────────────────────────────────────────────────

impl SnapshotStore for SqliteSnapshotStore {
  type Error = crate::Error;

  async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
    let rows      = encode_annotations(&snapshot.annotations)?;
    let saved_at  = encode_dt(snapshot.saved_at);
    let active_pk = snapshot.active_pk;
    let count     = i64::try_from(rows.len()).unwrap_or(i64::MAX);

    let snapshot_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO snapshots (saved_at, active_pk, annotation_count) VALUES (?1, ?2, ?3)",
          rusqlite::params![saved_at, active_pk, count],
        )?;
        let snapshot_id = tx.last_insert_rowid();
        {
          let mut stmt = tx.prepare(
            "INSERT INTO snapshot_annotations
               (snapshot_id, position, annotation_pk, annotation_json)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![snapshot_id, row.position, row.pk, row.json])?;
          }
        }
        tx.commit()?;
        Ok(snapshot_id)
      })
      .await?;

    debug!(snapshot_id, annotations = count, "saved snapshot");
    Ok(())
  }

  async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
    let raw: Option<RawSnapshot> = self
      .conn
      .call(|conn| {
        let head = conn
          .query_row(
            "SELECT snapshot_id, saved_at, active_pk, annotation_count
             FROM snapshots ORDER BY snapshot_id DESC LIMIT 1",
            [],
            |row| {
              Ok(RawSnapshot {
                snapshot_id:      row.get(0)?,
                saved_at:         row.get(1)?,
                active_pk:        row.get(2)?,
                annotation_count: row.get(3)?,
                annotations:      Vec::new(),
              })
            },
          )
          .optional()?;

        let Some(mut raw) = head else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT annotation_json FROM snapshot_annotations
           WHERE snapshot_id = ?1 ORDER BY position",
        )?;
        raw.annotations = stmt
          .query_map(rusqlite::params![raw.snapshot_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  async fn clear_snapshots(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM snapshots", [])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
