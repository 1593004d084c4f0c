//! The store's state tree and its read selectors.
//!
//! The state keeps the raw annotations exactly as received (`byPK`/`allPKs`)
//! next to the derived, per-annotation indices built by
//! [`crate::collect`]. Indices are wrapped in [`Arc`] so that a transition
//! touching one annotation leaves every other annotation's index
//! pointer-identical to the previous state.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator as _;

use crate::model::{Evidence, ItemType, Pk, Variant};

// ─── Per-annotation index ────────────────────────────────────────────────────

/// Flat lookup tables for the evidence and variants of one annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationIndex {
  /// Every evidence in the annotation, nested ones included, by PK.
  #[serde(rename = "evidenceByPK")]
  pub evidence_by_pk:       BTreeMap<Pk, Evidence>,
  /// Evidence PKs per item type, in traversal order.
  #[serde(rename = "allEvidencePKsByType")]
  pub evidence_pks_by_type: BTreeMap<String, Vec<Pk>>,
  #[serde(rename = "variantByPK")]
  pub variant_by_pk:        BTreeMap<Pk, Variant>,
  /// Variant PKs in the order they were first referenced.
  #[serde(rename = "variantPKs")]
  pub variant_pks:          Vec<Pk>,
}

impl Default for AnnotationIndex {
  /// An index with an empty PK list for each known item type.
  fn default() -> Self {
    Self {
      evidence_by_pk:       BTreeMap::new(),
      evidence_pks_by_type: ItemType::iter()
        .map(|kind| (kind.to_string(), Vec::new()))
        .collect(),
      variant_by_pk:        BTreeMap::new(),
      variant_pks:          Vec::new(),
    }
  }
}

impl AnnotationIndex {
  pub fn is_empty(&self) -> bool {
    self.evidence_by_pk.is_empty() && self.variant_by_pk.is_empty()
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// The whole annotation store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationsState {
  /// Raw annotation objects by PK.
  #[serde(rename = "byPK")]
  pub by_pk:                      BTreeMap<Pk, Arc<Value>>,
  /// Annotation PKs in the order they were received.
  #[serde(rename = "allPKs")]
  pub all_pks:                    Vec<Pk>,
  /// The annotation selected in the UI, if any.
  #[serde(rename = "activePK")]
  pub active_pk:                  Option<Pk>,
  pub is_loading:                 bool,
  pub fetch_error_message:        Option<String>,
  pub is_dirty_article_note_form: bool,
  #[serde(rename = "indexByAnnotation")]
  pub index_by_annotation:        BTreeMap<Pk, Arc<AnnotationIndex>>,
  /// Union of variant PKs across all annotations.
  #[serde(rename = "allVariantsSet")]
  pub all_variants:               Arc<BTreeSet<Pk>>,
}

/// A compact view of the store for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
  #[serde(rename = "allPKs")]
  pub all_pks:                    Vec<Pk>,
  #[serde(rename = "activePK")]
  pub active_pk:                  Option<Pk>,
  pub is_loading:                 bool,
  pub fetch_error_message:        Option<String>,
  pub is_dirty_article_note_form: bool,
  pub evidence_count:             usize,
  pub variant_count:              usize,
}

impl AnnotationsState {
  // ── Core lookups ──────────────────────────────────────────────────────

  pub fn index(&self, annotation_pk: &str) -> Option<&AnnotationIndex> {
    self.index_by_annotation.get(annotation_pk).map(Arc::as_ref)
  }

  /// An evidence of `annotation_pk`, with case-level children as PKs.
  pub fn evidence_by_pk(&self, annotation_pk: &str, evidence_pk: &str) -> Option<&Evidence> {
    self.index(annotation_pk)?.evidence_by_pk.get(evidence_pk)
  }

  /// A variant as referenced within `annotation_pk`, with its
  /// `associatedEvidences`.
  pub fn variant_by_pk(&self, annotation_pk: &str, variant_pk: &str) -> Option<&Variant> {
    self.index(annotation_pk)?.variant_by_pk.get(variant_pk)
  }

  /// Evidence PKs of one type in traversal order; empty when the annotation
  /// or the type is unknown.
  pub fn evidence_pks_by_type(&self, annotation_pk: &str, item_type: impl AsRef<str>) -> &[Pk] {
    self
      .index(annotation_pk)
      .and_then(|index| index.evidence_pks_by_type.get(item_type.as_ref()))
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  /// Every variant PK referenced by any annotation.
  pub fn all_variant_pks(&self) -> &BTreeSet<Pk> { &self.all_variants }

  // ── Annotation-level views ────────────────────────────────────────────

  /// Annotations in `allPKs` order.
  pub fn annotations(&self) -> impl Iterator<Item = &Value> + '_ {
    self
      .all_pks
      .iter()
      .filter_map(|pk| self.by_pk.get(pk).map(Arc::as_ref))
  }

  pub fn annotation(&self, annotation_pk: &str) -> Option<&Value> {
    self.by_pk.get(annotation_pk).map(Arc::as_ref)
  }

  /// The active annotation, when `activePK` names one that is loaded.
  pub fn active_annotation(&self) -> Option<&Value> {
    self.annotation(self.active_pk.as_deref()?)
  }

  pub fn evidence_from_active(&self, evidence_pk: &str) -> Option<&Evidence> {
    self.evidence_by_pk(self.active_pk.as_deref()?, evidence_pk)
  }

  pub fn variant_from_active(&self, variant_pk: &str) -> Option<&Variant> {
    self.variant_by_pk(self.active_pk.as_deref()?, variant_pk)
  }

  /// Resolved evidence objects of one type, in traversal order.
  pub fn evidences_by_type(&self, annotation_pk: &str, item_type: ItemType) -> Vec<&Evidence> {
    self
      .evidence_pks_by_type(annotation_pk, item_type)
      .iter()
      .filter_map(|pk| self.evidence_by_pk(annotation_pk, pk))
      .collect()
  }

  /// The variants referenced within one annotation, first-seen first.
  pub fn associated_variants(&self, annotation_pk: &str) -> Vec<&Variant> {
    let Some(index) = self.index(annotation_pk) else {
      return Vec::new();
    };
    index
      .variant_pks
      .iter()
      .filter_map(|pk| index.variant_by_pk.get(pk))
      .collect()
  }

  /// Locate a variant in the first annotation (in `allPKs` order) that
  /// references it.
  pub fn find_variant(&self, variant_pk: &str) -> Option<(&str, &Variant)> {
    self.all_pks.iter().find_map(|annotation_pk| {
      self
        .variant_by_pk(annotation_pk, variant_pk)
        .map(|variant| (annotation_pk.as_str(), variant))
    })
  }

  pub fn summary(&self) -> StateSummary {
    StateSummary {
      all_pks:                    self.all_pks.clone(),
      active_pk:                  self.active_pk.clone(),
      is_loading:                 self.is_loading,
      fetch_error_message:        self.fetch_error_message.clone(),
      is_dirty_article_note_form: self.is_dirty_article_note_form,
      evidence_count:             self
        .index_by_annotation
        .values()
        .map(|index| index.evidence_by_pk.len())
        .sum(),
      variant_count:              self.all_variants.len(),
    }
  }

  /// Rebuild the cross-annotation variant union from the per-annotation
  /// indices.
  pub(crate) fn recompute_all_variants(&mut self) {
    let all: BTreeSet<Pk> = self
      .index_by_annotation
      .values()
      .flat_map(|index| index.variant_by_pk.keys().cloned())
      .collect();
    self.all_variants = Arc::new(all);
  }
}
