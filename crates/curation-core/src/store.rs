//! The host-owned store and the `SnapshotStore` persistence seam.
//!
//! A host (CLI, API server) owns exactly one [`AnnotationStore`]; it is
//! created empty at start-up, fed by dispatching actions, and reset on
//! logout. Persistence backends (e.g. `curation-store-sqlite`) implement
//! [`SnapshotStore`]; the host decides when to save.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{action::AnnotationAction, model::Pk, reducer::reduce, state::AnnotationsState};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A single-writer holder for the current [`AnnotationsState`].
///
/// Every dispatch swaps in a new state; readers holding an earlier
/// `Arc<AnnotationsState>` keep seeing the state they took.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
  state: Arc<AnnotationsState>,
}

impl AnnotationStore {
  pub fn new() -> Self { Self::default() }

  pub fn state(&self) -> &AnnotationsState { &self.state }

  /// A handle on the current state that outlives later dispatches.
  pub fn snapshot_state(&self) -> Arc<AnnotationsState> { Arc::clone(&self.state) }

  /// Apply `action` and return the new state.
  pub fn dispatch(&mut self, action: AnnotationAction) -> &AnnotationsState {
    let kind = action.type_name();
    self.state = Arc::new(reduce(&self.state, action));
    debug!(
      action = kind,
      annotations = self.state.all_pks.len(),
      "dispatched annotation action"
    );
    &self.state
  }

  /// Rebuild the store from a persisted snapshot.
  pub fn rehydrate(&mut self, snapshot: Snapshot) -> &AnnotationsState {
    self.dispatch(snapshot.into_action())
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The persisted form of the store: raw annotations and the selection.
///
/// Derived indices are never persisted; they are rebuilt on rehydrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
  /// Annotations in `allPKs` order.
  pub annotations: Vec<Value>,
  #[serde(rename = "activePK")]
  pub active_pk:   Option<Pk>,
  pub saved_at:    DateTime<Utc>,
}

impl Snapshot {
  /// Capture the persistent part of `state`.
  pub fn capture(state: &AnnotationsState) -> Self {
    Self {
      annotations: state.annotations().cloned().collect(),
      active_pk:   state.active_pk.clone(),
      saved_at:    Utc::now(),
    }
  }

  /// The action that restores this snapshot into an empty store.
  pub fn into_action(self) -> AnnotationAction {
    AnnotationAction::Set {
      annotations:          self.annotations,
      active_annotation_pk: self.active_pk,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a place to keep store snapshots between runs.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SnapshotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `snapshot` as the most recent one.
  fn save_snapshot(
    &self,
    snapshot: Snapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The most recently saved snapshot, if any.
  fn load_snapshot(
    &self,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  /// Forget every saved snapshot (e.g. on logout).
  fn clear_snapshots(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn dispatch_swaps_state_and_keeps_old_handles() {
    let mut store = AnnotationStore::new();
    let before = store.snapshot_state();

    store.dispatch(AnnotationAction::Set {
      annotations:          vec![json!({ "PK": "A1" })],
      active_annotation_pk: Some("A1".into()),
    });

    assert!(before.all_pks.is_empty());
    assert_eq!(store.state().all_pks, ["A1"]);
  }

  #[test]
  fn snapshot_round_trips_through_rehydrate() {
    let mut store = AnnotationStore::new();
    store.dispatch(AnnotationAction::Set {
      annotations:          vec![
        json!({ "PK": "A2", "individuals": [{ "PK": "I1", "variants": [{ "PK": "V1" }] }] }),
        json!({ "PK": "A1" }),
      ],
      active_annotation_pk: Some("A1".into()),
    });
    store.dispatch(AnnotationAction::SetIsLoading { is_loading: true });

    let snapshot = Snapshot::capture(store.state());
    assert_eq!(snapshot.annotations[0]["PK"], "A2");

    let mut restored = AnnotationStore::new();
    restored.rehydrate(snapshot);
    assert_eq!(restored.state().all_pks, ["A2", "A1"]);
    assert_eq!(restored.state().active_pk.as_deref(), Some("A1"));
    assert_eq!(
      restored.state().index_by_annotation,
      store.state().index_by_annotation
    );
    // Flags are not persisted.
    assert!(!restored.state().is_loading);
  }

  #[test]
  fn snapshot_serializes_with_wire_names() {
    let snapshot = Snapshot {
      annotations: vec![],
      active_pk:   None,
      saved_at:    DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&Utc),
    };
    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["activePK"], Value::Null);
    assert_eq!(value["savedAt"], "2024-01-02T03:04:05Z");
  }
}
