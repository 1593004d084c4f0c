//! Plain-text rendering of the store for terminal output.

use std::fmt::Write as _;

use curation_core::{AnnotationsState, ItemType};
use strum::IntoEnumIterator as _;

/// One line per annotation with evidence counts per type, then the error
/// and global variant lines.
pub fn render(state: &AnnotationsState) -> String {
  let mut out = String::new();

  if let Some(message) = &state.fetch_error_message {
    let _ = writeln!(out, "fetch error: {message}");
  }

  for pk in &state.all_pks {
    let marker = if state.active_pk.as_deref() == Some(pk.as_str()) { "*" } else { " " };
    let counts: Vec<String> = ItemType::iter()
      .map(|kind| format!("{kind}={}", state.evidence_pks_by_type(pk, kind).len()))
      .collect();
    let variants = state.associated_variants(pk).len();
    let _ = writeln!(out, "{marker} {pk}  {}  variants={variants}", counts.join(" "));
  }

  let _ = writeln!(
    out,
    "{} annotation(s), {} distinct variant(s)",
    state.all_pks.len(),
    state.all_variant_pks().len()
  );
  out
}

/// Detailed listing of one annotation's evidence and variants.
pub fn render_annotation(state: &AnnotationsState, annotation_pk: &str) -> Option<String> {
  state.index(annotation_pk)?;
  let mut out = String::new();

  for kind in ItemType::iter() {
    let evidences = state.evidences_by_type(annotation_pk, kind);
    if evidences.is_empty() {
      continue;
    }
    let _ = writeln!(out, "{kind}:");
    for evidence in evidences {
      let label = evidence
        .field("label")
        .and_then(|v| v.as_str())
        .unwrap_or("");
      let _ = writeln!(out, "  {} {label}", evidence.pk);
    }
  }

  let variants = state.associated_variants(annotation_pk);
  if !variants.is_empty() {
    let _ = writeln!(out, "variants:");
    for variant in variants {
      let _ = writeln!(
        out,
        "  {} <- {}",
        variant.pk,
        variant.associated_evidences.join(", ")
      );
    }
  }
  Some(out)
}

#[cfg(test)]
mod tests {
  use curation_core::{AnnotationAction, reduce};
  use serde_json::json;

  use super::*;

  fn state() -> AnnotationsState {
    reduce(&AnnotationsState::default(), AnnotationAction::Set {
      annotations:          vec![
        json!({
          "PK": "A1",
          "groups": [{
            "PK": "G1",
            "item_type": "group",
            "label": "Cohort 1",
            "individualIncluded": [{
              "PK": "I1",
              "item_type": "individual",
              "variants": [{ "PK": "V1" }],
            }],
          }],
        }),
        json!({ "PK": "A2" }),
      ],
      active_annotation_pk: Some("A2".into()),
    })
  }

  #[test]
  fn summary_marks_active_annotation() {
    let text = render(&state());
    assert!(text.contains("  A1  group=1 family=0 individual=1 caseControl=0 experimental=0  variants=1"));
    assert!(text.contains("* A2"));
    assert!(text.ends_with("2 annotation(s), 1 distinct variant(s)\n"));
  }

  #[test]
  fn annotation_detail_lists_evidence_and_variants() {
    let text = render_annotation(&state(), "A1").unwrap();
    assert!(text.contains("group:\n  G1 Cohort 1\n"));
    assert!(text.contains("individual:\n  I1 \n"));
    assert!(text.contains("variants:\n  V1 <- I1\n"));
    assert!(render_annotation(&state(), "A3").is_none());
  }
}
