//! Handlers for the store itself.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/state` | Status summary |
//! | `POST` | `/dispatch` | Body: an action, e.g. `{"type":"ACTIVATE_ANNOTATION","annotationPK":"A1"}` |

use axum::{Json, extract::State};
use curation_core::{AnnotationAction, Snapshot, SnapshotStore, state::StateSummary};
use tracing::info;

use crate::{
  ApiState,
  error::{ApiError, SnapshotOp},
};

/// `GET /state`
pub async fn summary<S>(State(state): State<ApiState<S>>) -> Json<StateSummary>
where
  S: SnapshotStore,
{
  Json(state.store.read().await.state().summary())
}

/// `POST /dispatch`
///
/// Applies the action and returns the new summary. A reset clears saved
/// snapshots; any other action that touches the annotation set saves one.
/// The write lock is held until persistence finishes, so the newest saved
/// snapshot always matches the newest state.
pub async fn dispatch<S>(
  State(state): State<ApiState<S>>,
  Json(action): Json<AnnotationAction>,
) -> Result<Json<StateSummary>, ApiError>
where
  S: SnapshotStore,
{
  let kind = action.type_name();
  let is_reset = matches!(action, AnnotationAction::Reset);
  let persist = action.touches_annotations();

  let mut store = state.store.write().await;
  let next = store.dispatch(action);
  let summary = next.summary();
  let snapshot = (persist && !is_reset).then(|| Snapshot::capture(next));
  info!(action = kind, annotations = summary.all_pks.len(), "dispatched");

  if let Some(snapshots) = &state.snapshots {
    if is_reset {
      snapshots
        .clear_snapshots()
        .await
        .map_err(|e| ApiError::snapshot(SnapshotOp::Clear, e))?;
    } else if let Some(snapshot) = snapshot {
      snapshots
        .save_snapshot(snapshot)
        .await
        .map_err(|e| ApiError::snapshot(SnapshotOp::Save, e))?;
    }
  }
  drop(store);

  Ok(Json(summary))
}
