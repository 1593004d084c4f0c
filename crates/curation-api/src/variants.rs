//! Handlers for cross-annotation `/variants` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/variants` | Every variant PK referenced by any annotation |
//! | `GET`  | `/variants/:variant_pk` | First annotation referencing it, with the variant |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, State},
};
use curation_core::{Pk, SnapshotStore, Variant};
use serde::Serialize;

use crate::{ApiState, error::ApiError};

/// `GET /variants`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Json<BTreeSet<Pk>>
where
  S: SnapshotStore,
{
  Json(state.store.read().await.state().all_variant_pks().clone())
}

/// A variant located through [`find`].
#[derive(Debug, Serialize)]
pub struct FoundVariant {
  #[serde(rename = "annotationPK")]
  pub annotation_pk: Pk,
  pub variant:       Variant,
}

/// `GET /variants/:variant_pk`
pub async fn find<S>(
  State(state): State<ApiState<S>>,
  Path(variant_pk): Path<String>,
) -> Result<Json<FoundVariant>, ApiError>
where
  S: SnapshotStore,
{
  let store = state.store.read().await;
  let (annotation_pk, variant) = store
    .state()
    .find_variant(&variant_pk)
    .ok_or_else(|| ApiError::NotFound(format!("variant {variant_pk} not found")))?;
  Ok(Json(FoundVariant {
    annotation_pk: annotation_pk.to_owned(),
    variant:       variant.clone(),
  }))
}
