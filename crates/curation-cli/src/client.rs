//! Async HTTP client for the curation backend's annotation endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use curation_core::{AnnotationAction, AnnotationStore, AnnotationsState, Pk};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

/// Async HTTP client for `GET /annotations`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct BackendClient {
  client:   Client,
  base_url: String,
}

impl BackendClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Load every annotation of a GDM into `store`.
  ///
  /// Mirrors the curation page loader: the store is marked loading, then
  /// receives either a fetch-success with the annotations or a fetch-failure
  /// naming the request. Failures are recorded in the store, not returned.
  pub async fn fetch_into<'s>(
    &self,
    store: &'s mut AnnotationStore,
    gdm_pk: &str,
    active_pk: Option<Pk>,
  ) -> &'s AnnotationsState {
    store.dispatch(AnnotationAction::SetIsLoading { is_loading: true });

    let request = format!("GET /annotations?associatedGdm={gdm_pk}");
    let action = match self.get_annotations(gdm_pk).await {
      Ok(body) => action_for_body(&request, body, active_pk),
      Err(e) => {
        warn!(gdm = gdm_pk, "annotation fetch failed: {e:#}");
        AnnotationAction::FetchFailure {
          error_message: format!("FetchAnnotationsError: {e:#} ({request})"),
        }
      }
    };
    store.dispatch(action)
  }

  /// `GET /annotations?associatedGdm=<pk>`
  async fn get_annotations(&self, gdm_pk: &str) -> Result<Value> {
    let resp = self
      .client
      .get(self.url("/annotations"))
      .query(&[("associatedGdm", gdm_pk)])
      .send()
      .await
      .context("request failed")?
      .error_for_status()
      .context("server returned an error")?;
    resp.json().await.context("deserialising annotations")
  }
}

/// Turn a successfully received body into the action to dispatch.
///
/// Any array, even an empty one, is a valid answer. Anything else means the
/// server did not return a result.
fn action_for_body(request: &str, body: Value, active_pk: Option<Pk>) -> AnnotationAction {
  match body {
    Value::Array(annotations) => {
      info!(count = annotations.len(), "fetched annotations");
      AnnotationAction::FetchSuccess {
        annotations,
        active_annotation_pk: active_pk,
      }
    }
    _ => AnnotationAction::FetchFailure {
      error_message: format!("Empty response from server at {request}"),
    },
  }
}
