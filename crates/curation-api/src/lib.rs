//! JSON REST API over the curation annotation store.
//!
//! Exposes an axum [`Router`] that serves the store's read selectors and
//! accepts actions for dispatch. When a [`SnapshotStore`] is attached, every
//! dispatch that changes the annotation set is persisted.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", curation_api::api_router(state.clone()))
//! ```

pub mod annotations;
pub mod dispatch;
pub mod error;
pub mod variants;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use curation_core::{AnnotationStore, SnapshotStore};
use tokio::sync::RwLock;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
///
/// The store is the host's single instance; dispatches serialize on its
/// write lock.
pub struct ApiState<S> {
  pub store:     Arc<RwLock<AnnotationStore>>,
  pub snapshots: Option<Arc<S>>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      snapshots: self.snapshots.clone(),
    }
  }
}

impl<S> ApiState<S> {
  pub fn new(store: AnnotationStore, snapshots: Option<S>) -> Self {
    Self {
      store:     Arc::new(RwLock::new(store)),
      snapshots: snapshots.map(Arc::new),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: SnapshotStore + 'static,
{
  Router::new()
    // Store
    .route("/state", get(dispatch::summary::<S>))
    .route("/dispatch", post(dispatch::dispatch::<S>))
    // Annotations
    .route("/annotations", get(annotations::list::<S>))
    .route("/annotations/{pk}", get(annotations::get_one::<S>))
    .route("/annotations/{pk}/evidence", get(annotations::evidence_pks::<S>))
    .route(
      "/annotations/{pk}/evidence/{evidence_pk}",
      get(annotations::evidence_one::<S>),
    )
    .route("/annotations/{pk}/variants", get(annotations::variants::<S>))
    .route(
      "/annotations/{pk}/variants/{variant_pk}",
      get(annotations::variant_one::<S>),
    )
    // Variants
    .route("/variants", get(variants::list::<S>))
    .route("/variants/{variant_pk}", get(variants::find::<S>))
    .with_state(state)
}
