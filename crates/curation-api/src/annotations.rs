//! Handlers for `/annotations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/annotations` | Raw annotations in load order |
//! | `GET`  | `/annotations/:pk` | 404 if not loaded |
//! | `GET`  | `/annotations/:pk/evidence` | Optional `?item_type=group\|family\|...`; PK lists |
//! | `GET`  | `/annotations/:pk/evidence/:evidence_pk` | Normalized evidence |
//! | `GET`  | `/annotations/:pk/variants` | Associated variants, first-seen first |
//! | `GET`  | `/annotations/:pk/variants/:variant_pk` | One variant |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use curation_core::{AnnotationIndex, Evidence, ItemType, SnapshotStore, Variant};
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiState, error::ApiError};

fn annotation_not_found(pk: &str) -> ApiError {
  ApiError::NotFound(format!("annotation {pk} not found"))
}

// ─── List / get ───────────────────────────────────────────────────────────────

/// `GET /annotations`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Json<Vec<Value>>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  Json(store.state().annotations().cloned().collect())
}

/// `GET /annotations/:pk`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(pk): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  store
    .state()
    .annotation(&pk)
    .cloned()
    .map(Json)
    .ok_or_else(|| annotation_not_found(&pk))
}

// ─── Evidence ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EvidenceParams {
  /// Restrict to one item type, e.g. `family` or `caseControl`.
  pub item_type: Option<String>,
}

/// `GET /annotations/:pk/evidence[?item_type=<type>]`
///
/// With `item_type`, the ordered PK list for that type; without it, the whole
/// type → PK-list map.
pub async fn evidence_pks<S>(
  State(state): State<ApiState<S>>,
  Path(pk): Path<String>,
  Query(params): Query<EvidenceParams>,
) -> Result<Json<Value>, ApiError>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  let index: &AnnotationIndex = store
    .state()
    .index(&pk)
    .ok_or_else(|| annotation_not_found(&pk))?;

  let body = match params.item_type.as_deref() {
    Some(item_type) => {
      let kind = ItemType::parse(item_type).map_err(|e| ApiError::BadRequest(e.to_string()))?;
      serde_json::to_value(store.state().evidence_pks_by_type(&pk, kind))
    }
    None => serde_json::to_value(&index.evidence_pks_by_type),
  }
  .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  Ok(Json(body))
}

/// `GET /annotations/:pk/evidence/:evidence_pk`
pub async fn evidence_one<S>(
  State(state): State<ApiState<S>>,
  Path((pk, evidence_pk)): Path<(String, String)>,
) -> Result<Json<Evidence>, ApiError>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  store
    .state()
    .evidence_by_pk(&pk, &evidence_pk)
    .cloned()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("evidence {evidence_pk} not found in {pk}")))
}

// ─── Variants ─────────────────────────────────────────────────────────────────

/// `GET /annotations/:pk/variants`
pub async fn variants<S>(
  State(state): State<ApiState<S>>,
  Path(pk): Path<String>,
) -> Result<Json<Vec<Variant>>, ApiError>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  if store.state().index(&pk).is_none() {
    return Err(annotation_not_found(&pk));
  }
  Ok(Json(
    store
      .state()
      .associated_variants(&pk)
      .into_iter()
      .cloned()
      .collect(),
  ))
}

/// `GET /annotations/:pk/variants/:variant_pk`
pub async fn variant_one<S>(
  State(state): State<ApiState<S>>,
  Path((pk, variant_pk)): Path<(String, String)>,
) -> Result<Json<Variant>, ApiError>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  store
    .state()
    .variant_by_pk(&pk, &variant_pk)
    .cloned()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("variant {variant_pk} not found in {pk}")))
}
