//! Encoding and decoding helpers between snapshot types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; annotations as compact JSON.

use chrono::{DateTime, Utc};
use curation_core::{Pk, Snapshot};
use serde_json::Value;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Annotations ─────────────────────────────────────────────────────────────

/// One `snapshot_annotations` row, ready to bind.
pub struct EncodedAnnotation {
  pub position: i64,
  pub pk:       Option<String>,
  pub json:     String,
}

pub fn encode_annotations(annotations: &[Value]) -> Result<Vec<EncodedAnnotation>> {
  annotations
    .iter()
    .zip(0_i64..)
    .map(|(annotation, position)| {
      Ok(EncodedAnnotation {
        position,
        pk: curation_core::model::pk_of(annotation).map(str::to_owned),
        json: serde_json::to_string(annotation)?,
      })
    })
    .collect()
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Flat representation of a `snapshots` row plus its annotation rows, read
/// directly from SQLite before decoding.
pub struct RawSnapshot {
  pub snapshot_id:      i64,
  pub saved_at:         String,
  pub active_pk:        Option<Pk>,
  pub annotation_count: i64,
  /// `annotation_json` values ordered by `position`.
  pub annotations:      Vec<String>,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<Snapshot> {
    let expected = usize::try_from(self.annotation_count).unwrap_or_default();
    if self.annotations.len() != expected {
      return Err(Error::IncompleteSnapshot {
        id: self.snapshot_id,
        expected,
        found: self.annotations.len(),
      });
    }

    let annotations = self
      .annotations
      .iter()
      .map(|json| serde_json::from_str(json))
      .collect::<Result<Vec<Value>, _>>()?;

    Ok(Snapshot {
      annotations,
      active_pk: self.active_pk,
      saved_at: decode_dt(&self.saved_at)?,
    })
  }
}
