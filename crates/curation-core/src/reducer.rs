//! The store's transition function.
//!
//! [`reduce`] is pure: it reads the previous state, never mutates it, and
//! returns the next one. It never fails. Malformed annotations are logged and
//! contribute nothing.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  action::AnnotationAction,
  collect::collect_annotation,
  model::Pk,
  state::AnnotationsState,
};

/// Compute the state that follows `state` once `action` is applied.
pub fn reduce(state: &AnnotationsState, action: AnnotationAction) -> AnnotationsState {
  match action {
    AnnotationAction::Reset => AnnotationsState::default(),

    AnnotationAction::Set {
      annotations,
      active_annotation_pk,
    } => set_all(annotations, active_annotation_pk),

    AnnotationAction::FetchSuccess {
      annotations,
      active_annotation_pk,
    } => AnnotationsState {
      fetch_error_message: None,
      is_loading: false,
      ..set_all(annotations, active_annotation_pk)
    },

    AnnotationAction::FetchFailure { error_message } => AnnotationsState {
      fetch_error_message: Some(error_message),
      is_loading: false,
      ..AnnotationsState::default()
    },

    AnnotationAction::Add { annotation } => upsert(state, annotation, Upsert::Add),

    AnnotationAction::Update { annotation } => upsert(state, annotation, Upsert::Update),

    AnnotationAction::ActivateAnnotation { annotation_pk } => AnnotationsState {
      active_pk: annotation_pk,
      ..state.clone()
    },

    AnnotationAction::SetIsLoading { is_loading } => AnnotationsState {
      is_loading,
      ..state.clone()
    },

    AnnotationAction::SetIsDirtyArticleNoteForm { is_dirty } => AnnotationsState {
      is_dirty_article_note_form: is_dirty,
      ..state.clone()
    },
  }
}

/// Build a fresh state from a complete annotation list.
///
/// A PK that appears more than once keeps its first position in `allPKs`;
/// the last occurrence provides the object and its index.
fn set_all(annotations: Vec<Value>, active_pk: Option<Pk>) -> AnnotationsState {
  let mut state = AnnotationsState {
    active_pk,
    ..AnnotationsState::default()
  };

  for annotation in annotations {
    let Some((pk, index)) = collect_annotation(&annotation) else {
      continue;
    };
    if state.by_pk.insert(pk.clone(), Arc::new(annotation)).is_none() {
      state.all_pks.push(pk.clone());
    } else {
      warn!(annotation = %pk, "annotation listed twice; keeping the later copy");
    }
    state.index_by_annotation.insert(pk, Arc::new(index));
  }
  state.recompute_all_variants();

  debug!(
    annotations = state.all_pks.len(),
    variants = state.all_variants.len(),
    "rebuilt annotation indices"
  );
  state
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
  Add,
  Update,
}

/// Insert or replace one annotation, re-indexing only that annotation.
///
/// Other annotations' indices are carried over by `Arc` and stay
/// pointer-identical. The global variant union is recomputed either way,
/// since the annotation may stop or start referencing variants.
fn upsert(state: &AnnotationsState, annotation: Value, op: Upsert) -> AnnotationsState {
  let Some((pk, index)) = collect_annotation(&annotation) else {
    warn!(?op, "annotation without a PK ignored");
    return state.clone();
  };

  let mut next = state.clone();
  let existed = next.by_pk.insert(pk.clone(), Arc::new(annotation)).is_some();
  match (op, existed) {
    (Upsert::Add, true) => {
      debug!(annotation = %pk, "added annotation already present; replaced in place");
    }
    (Upsert::Update, false) => {
      warn!(annotation = %pk, "updated annotation was not loaded; appending it");
      next.all_pks.push(pk.clone());
    }
    (Upsert::Add, false) => next.all_pks.push(pk.clone()),
    (Upsert::Update, true) => {}
  }

  next.index_by_annotation.insert(pk, Arc::new(index));
  next.recompute_all_variants();
  next
}
