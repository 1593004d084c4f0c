//! Actions accepted by the annotation store.
//!
//! The wire form is an object tagged by `type`, using the same type strings
//! and camelCase payload keys the curation front-end dispatches, e.g.
//! `{"type": "ACTIVATE_ANNOTATION", "annotationPK": "A1"}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Pk;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationAction {
  /// Return to the empty initial state.
  #[serde(rename = "RESET_ANNOTATIONS")]
  Reset,

  /// Replace every annotation and rebuild all indices.
  #[serde(rename = "SET_ANNOTATIONS", rename_all = "camelCase")]
  Set {
    annotations:          Vec<Value>,
    #[serde(rename = "activeAnnotationPK", default)]
    active_annotation_pk: Option<Pk>,
  },

  /// As [`Self::Set`], for a completed fetch; also clears the loading flag
  /// and any previous fetch error.
  #[serde(rename = "FETCH_SUCCESS_ANNOTATIONS", rename_all = "camelCase")]
  FetchSuccess {
    annotations:          Vec<Value>,
    #[serde(rename = "activeAnnotationPK", default)]
    active_annotation_pk: Option<Pk>,
  },

  /// Drop everything and record why the fetch failed.
  #[serde(rename = "FETCH_FAILURE_ANNOTATIONS", rename_all = "camelCase")]
  FetchFailure { error_message: String },

  /// Append one annotation and index it.
  #[serde(rename = "ADD_ANNOTATION", alias = "ADD_ANNOTAION")]
  Add { annotation: Value },

  /// Replace one annotation and re-index it.
  #[serde(rename = "UPDATE_ANNOTATION")]
  Update { annotation: Value },

  #[serde(rename = "ACTIVATE_ANNOTATION")]
  ActivateAnnotation {
    #[serde(rename = "annotationPK", default)]
    annotation_pk: Option<Pk>,
  },

  #[serde(rename = "IS_LOADING_ANNOTATION", rename_all = "camelCase")]
  SetIsLoading { is_loading: bool },

  /// Track unsaved edits in the article note form.
  #[serde(rename = "SET_DIRTY_ARTICLE_NOTE_FORM", rename_all = "camelCase")]
  SetIsDirtyArticleNoteForm { is_dirty: bool },
}

impl AnnotationAction {
  /// The wire `type` string of this action.
  pub fn type_name(&self) -> &'static str {
    match self {
      Self::Reset => "RESET_ANNOTATIONS",
      Self::Set { .. } => "SET_ANNOTATIONS",
      Self::FetchSuccess { .. } => "FETCH_SUCCESS_ANNOTATIONS",
      Self::FetchFailure { .. } => "FETCH_FAILURE_ANNOTATIONS",
      Self::Add { .. } => "ADD_ANNOTATION",
      Self::Update { .. } => "UPDATE_ANNOTATION",
      Self::ActivateAnnotation { .. } => "ACTIVATE_ANNOTATION",
      Self::SetIsLoading { .. } => "IS_LOADING_ANNOTATION",
      Self::SetIsDirtyArticleNoteForm { .. } => "SET_DIRTY_ARTICLE_NOTE_FORM",
    }
  }

  /// Whether applying this action can change the set of stored annotations
  /// (as opposed to UI flags only).
  pub fn touches_annotations(&self) -> bool {
    !matches!(
      self,
      Self::ActivateAnnotation { .. }
        | Self::SetIsLoading { .. }
        | Self::SetIsDirtyArticleNoteForm { .. }
    )
  }
}
