//! Flattening one annotation's nested evidence tree into an
//! [`AnnotationIndex`].
//!
//! Traversal is depth-first and children are registered before their parent:
//! a group's families (each with its individuals), then the group's own
//! individuals, then the group. The parent keeps only the PKs of its
//! case-level children. Input is never modified; every indexed record is a
//! fresh copy.
//!
//! Malformed input never aborts collection. Non-array lists read as empty,
//! records without a PK are skipped, and non-object variant references are
//! dropped with a warning.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
  model::{Evidence, ItemType, Pk, Variant, pk_of},
  state::AnnotationIndex,
  variant_refs::{VariantLayout, VariantRefs},
};

const FAMILY_INCLUDED: &str = "familyIncluded";
const INDIVIDUAL_INCLUDED: &str = "individualIncluded";

/// Build the index for one annotation.
///
/// Returns `None` when the annotation is not an object with a string `PK`;
/// such an annotation cannot be addressed and contributes nothing.
pub fn collect_annotation(annotation: &Value) -> Option<(Pk, AnnotationIndex)> {
  let Some(annotation_pk) = pk_of(annotation) else {
    warn!("annotation without a PK; no evidence collected");
    return None;
  };

  let mut collector = Collector {
    annotation_pk,
    index: AnnotationIndex::default(),
  };

  for group in array_field(annotation, "groups") {
    collector.group(group);
  }
  for family in array_field(annotation, "families") {
    collector.family(family);
  }
  for individual in array_field(annotation, "individuals") {
    collector.individual(individual);
  }
  for experimental in array_field(annotation, "experimentalData") {
    collector.leaf(experimental, ItemType::Experimental);
  }
  for case_control in array_field(annotation, "caseControlStudies") {
    collector.leaf(case_control, ItemType::CaseControl);
  }

  debug!(
    annotation = annotation_pk,
    evidence = collector.index.evidence_by_pk.len(),
    variants = collector.index.variant_by_pk.len(),
    "collected annotation evidence"
  );
  Some((annotation_pk.to_owned(), collector.index))
}

// ─── Traversal ───────────────────────────────────────────────────────────────

struct Collector<'a> {
  annotation_pk: &'a str,
  index:         AnnotationIndex,
}

impl Collector<'_> {
  fn group(&mut self, group: &Value) {
    let Some(raw) = self.as_record(group, ItemType::Group) else {
      return;
    };
    let families = array_field(group, FAMILY_INCLUDED);
    let individuals = array_field(group, INDIVIDUAL_INCLUDED);

    for family in families {
      self.family(family);
    }
    for individual in individuals {
      self.individual(individual);
    }

    self.register(raw, ItemType::Group, Children {
      families:    Some(pk_projection(families)),
      individuals: Some(pk_projection(individuals)),
    });
  }

  fn family(&mut self, family: &Value) {
    let Some(raw) = self.as_record(family, ItemType::Family) else {
      return;
    };
    let individuals = array_field(family, INDIVIDUAL_INCLUDED);

    for individual in individuals {
      self.individual(individual);
    }

    self.register(raw, ItemType::Family, Children {
      families:    None,
      individuals: Some(pk_projection(individuals)),
    });
  }

  fn individual(&mut self, individual: &Value) { self.leaf(individual, ItemType::Individual); }

  fn leaf(&mut self, evidence: &Value, kind: ItemType) {
    if let Some(raw) = self.as_record(evidence, kind) {
      self.register(raw, kind, Children::default());
    }
  }

  fn as_record<'v>(&self, value: &'v Value, kind: ItemType) -> Option<&'v Map<String, Value>> {
    let record = value.as_object();
    if record.is_none() {
      warn!(
        annotation = self.annotation_pk,
        kind = %kind,
        "{kind} entry is not an object; skipped"
      );
    }
    record
  }

  /// Add one evidence and the variants it references to the index.
  ///
  /// `kind` is the type implied by where the record was found; it decides
  /// the variant layout and stands in for a missing `item_type`.
  fn register(&mut self, raw: &Map<String, Value>, kind: ItemType, children: Children) {
    let Some(evidence_pk) = raw.get("PK").and_then(Value::as_str) else {
      warn!(
        annotation = self.annotation_pk,
        kind = %kind,
        "{kind} without a PK; skipped"
      );
      return;
    };
    if self.index.evidence_by_pk.contains_key(evidence_pk) {
      debug!(
        annotation = self.annotation_pk,
        evidence = evidence_pk,
        "evidence already indexed under another parent"
      );
      return;
    }

    let item_type = raw
      .get("item_type")
      .and_then(Value::as_str)
      .map(str::to_owned)
      .unwrap_or_else(|| kind.to_string());

    for reference in VariantRefs::read(raw, VariantLayout::from(kind)).iter() {
      self.reference_variant(reference, evidence_pk, &item_type);
    }

    let fields = raw
      .iter()
      .filter(|(key, _)| !children.replaces(key))
      .filter(|(key, _)| !matches!(key.as_str(), "PK" | "item_type"))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    self
      .index
      .evidence_pks_by_type
      .entry(item_type.clone())
      .or_default()
      .push(evidence_pk.to_owned());
    self.index.evidence_by_pk.insert(evidence_pk.to_owned(), Evidence {
      pk: evidence_pk.to_owned(),
      item_type,
      family_included: children.families,
      individual_included: children.individuals,
      fields,
    });
  }

  fn reference_variant(&mut self, reference: &Value, evidence_pk: &str, item_type: &str) {
    let Some(raw) = reference.as_object() else {
      warn!(
        annotation = self.annotation_pk,
        evidence = evidence_pk,
        "variant on {item_type}({evidence_pk}) is not an object (skipped): {reference}"
      );
      return;
    };

    let Some(variant_pk) = raw.get("PK").and_then(Value::as_str) else {
      warn!(
        annotation = self.annotation_pk,
        evidence = evidence_pk,
        "variant on {item_type}({evidence_pk}) has no PK (skipped)"
      );
      return;
    };

    if let Some(variant) = self.index.variant_by_pk.get_mut(variant_pk) {
      // One evidence's references are read together; a repeat within them
      // is the same association.
      if variant.associated_evidences.last().map(String::as_str) != Some(evidence_pk) {
        variant.associated_evidences.push(evidence_pk.to_owned());
      }
    } else if let Some(variant) = Variant::from_reference(raw, evidence_pk) {
      self.index.variant_pks.push(variant.pk.clone());
      self.index.variant_by_pk.insert(variant.pk.clone(), variant);
    }
  }
}

/// Normalized case-level children of a group or family.
#[derive(Default)]
struct Children {
  families:    Option<Vec<Pk>>,
  individuals: Option<Vec<Pk>>,
}

impl Children {
  /// Whether `key` is an embedded field these PK lists stand in for.
  fn replaces(&self, key: &str) -> bool {
    (key == FAMILY_INCLUDED && self.families.is_some())
      || (key == INDIVIDUAL_INCLUDED && self.individuals.is_some())
  }
}

fn array_field<'v>(value: &'v Value, key: &str) -> &'v [Value] {
  value
    .get(key)
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or_default()
}

fn pk_projection(records: &[Value]) -> Vec<Pk> {
  records
    .iter()
    .filter_map(pk_of)
    .map(str::to_owned)
    .collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn collect(annotation: Value) -> AnnotationIndex {
    collect_annotation(&annotation).expect("annotation has a PK").1
  }

  fn pks(index: &AnnotationIndex, kind: ItemType) -> Vec<&str> {
    index.evidence_pks_by_type[kind.as_ref()]
      .iter()
      .map(String::as_str)
      .collect()
  }

  #[test]
  fn nested_group_is_flattened_children_first() {
    let index = collect(json!({
      "PK": "A1",
      "groups": [{
        "PK": "G1",
        "item_type": "group",
        "familyIncluded": [{
          "PK": "F1",
          "item_type": "family",
          "individualIncluded": [{
            "PK": "I1",
            "item_type": "individual",
            "variants": [{ "PK": "V1" }],
          }],
        }],
        "individualIncluded": [{ "PK": "I2", "item_type": "individual" }],
      }],
    }));

    assert_eq!(pks(&index, ItemType::Individual), ["I1", "I2"]);
    assert_eq!(pks(&index, ItemType::Family), ["F1"]);
    assert_eq!(pks(&index, ItemType::Group), ["G1"]);

    let group = &index.evidence_by_pk["G1"];
    assert_eq!(group.family_included.as_deref(), Some(&["F1".to_owned()][..]));
    assert_eq!(group.individual_included.as_deref(), Some(&["I2".to_owned()][..]));
    assert!(group.field(FAMILY_INCLUDED).is_none());

    let family = &index.evidence_by_pk["F1"];
    assert_eq!(family.individual_included.as_deref(), Some(&["I1".to_owned()][..]));
    assert!(index.evidence_by_pk.contains_key("I1"));

    assert_eq!(index.variant_by_pk["V1"].associated_evidences, ["I1"]);
    assert_eq!(index.variant_pks, ["V1"]);
  }

  #[test]
  fn shared_variant_accumulates_associated_evidences() {
    let index = collect(json!({
      "PK": "A1",
      "individuals": [
        { "PK": "I1", "item_type": "individual", "variants": [{ "PK": "V1", "hgvs": "x" }] },
        {
          "PK": "I2",
          "item_type": "individual",
          "variantScores": [{ "variantScored": { "PK": "V1" } }],
        },
      ],
      "experimentalData": [
        { "PK": "E1", "item_type": "experimental", "variants": [{ "PK": "V1" }, { "PK": "V2" }] },
      ],
    }));

    assert_eq!(index.variant_by_pk.len(), 2);
    let v1 = &index.variant_by_pk["V1"];
    assert_eq!(v1.associated_evidences, ["I1", "I2", "E1"]);
    assert_eq!(v1.fields["hgvs"], "x");
    assert_eq!(index.variant_pks, ["V1", "V2"]);
  }

  #[test]
  fn partly_migrated_individual_is_associated_once() {
    let index = collect(json!({
      "PK": "A1",
      "individuals": [{
        "PK": "I1",
        "item_type": "individual",
        "variantScores": [{ "variantScored": { "PK": "V1" } }],
        "variants": [{ "PK": "V1" }, { "PK": "V2" }, { "PK": "V2" }],
      }],
      "experimentalData": [
        { "PK": "E1", "item_type": "experimental", "variants": [{ "PK": "V1" }] },
      ],
    }));

    assert_eq!(index.variant_by_pk["V1"].associated_evidences, ["I1", "E1"]);
    assert_eq!(index.variant_by_pk["V2"].associated_evidences, ["I1"]);
    assert_eq!(index.variant_pks, ["V1", "V2"]);
  }

  #[test]
  fn family_variants_come_from_segregation() {
    let index = collect(json!({
      "PK": "A1",
      "families": [{
        "PK": "F1",
        "item_type": "family",
        "segregation": { "variants": [{ "PK": "V7" }] },
      }],
    }));
    assert_eq!(index.variant_by_pk["V7"].associated_evidences, ["F1"]);
    // Segregation data stays embedded on the family.
    assert!(index.evidence_by_pk["F1"].field("segregation").is_some());
  }

  #[test]
  fn non_object_variants_are_skipped() {
    let index = collect(json!({
      "PK": "A1",
      "individuals": [{
        "PK": "I1",
        "item_type": "individual",
        "variants": ["V1", null, { "PK": "V2" }, { "noPk": true }],
        "variantScores": [{ "score": 0.5 }],
      }],
    }));
    assert_eq!(index.variant_pks, ["V2"]);
    assert_eq!(pks(&index, ItemType::Individual), ["I1"]);
  }

  #[test]
  fn duplicate_evidence_is_indexed_once() {
    let individual = json!({ "PK": "I1", "item_type": "individual", "variants": [{ "PK": "V1" }] });
    let index = collect(json!({
      "PK": "A1",
      "families": [{ "PK": "F1", "item_type": "family", "individualIncluded": [individual.clone()] }],
      "individuals": [individual],
    }));
    assert_eq!(pks(&index, ItemType::Individual), ["I1"]);
    assert_eq!(index.variant_by_pk["V1"].associated_evidences, ["I1"]);
  }

  #[test]
  fn empty_annotation_yields_empty_type_lists() {
    let index = collect(json!({ "PK": "A1", "article": { "PK": "12345" } }));
    assert!(index.is_empty());
    assert_eq!(index.evidence_pks_by_type.len(), 5);
    assert!(index.evidence_pks_by_type.values().all(Vec::is_empty));
  }

  #[test]
  fn malformed_lists_and_records_are_tolerated() {
    let index = collect(json!({
      "PK": "A1",
      "groups": "not-a-list",
      "families": [42, { "item_type": "family", "individualIncluded": [{ "PK": "I9" }] }],
      "caseControlStudies": [{ "PK": "C1" }],
    }));
    // The PK-less family is dropped but its individual is kept.
    assert_eq!(pks(&index, ItemType::Individual), ["I9"]);
    assert!(pks(&index, ItemType::Family).is_empty());
    // Missing item_type falls back to the collection's kind.
    assert_eq!(index.evidence_by_pk["C1"].item_type, "caseControl");
    assert_eq!(pks(&index, ItemType::CaseControl), ["C1"]);
  }

  #[test]
  fn annotation_without_pk_is_ignored() {
    assert!(collect_annotation(&json!({ "groups": [] })).is_none());
    assert!(collect_annotation(&json!("A1")).is_none());
  }

  #[test]
  fn input_is_not_modified() {
    let annotation = json!({
      "PK": "A1",
      "groups": [{ "PK": "G1", "familyIncluded": [{ "PK": "F1" }] }],
    });
    let before = annotation.clone();
    collect_annotation(&annotation);
    assert_eq!(annotation, before);
  }
}
