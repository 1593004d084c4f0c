//! Normalized record types: the flat shapes the store hands to readers.
//!
//! Annotations themselves stay as raw [`serde_json::Value`]s exactly as the
//! backend returned them. Evidence and variants are lifted into typed records
//! that keep every field they arrived with, plus the few fields the store
//! rewrites or adds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// A primary key as issued by the backend.
pub type Pk = String;

// ─── Item types ──────────────────────────────────────────────────────────────

/// The evidence kinds an annotation can embed. The string forms match the
/// backend's `item_type` values.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ItemType {
  Group,
  Family,
  Individual,
  CaseControl,
  Experimental,
}

impl ItemType {
  /// Parse an `item_type` string, rejecting anything outside the five kinds.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownItemType(s.to_owned()))
  }
}

// ─── Evidence ────────────────────────────────────────────────────────────────

/// One evidence record as stored in the flat index.
///
/// Embedded case-level children (`familyIncluded`, `individualIncluded`) are
/// replaced by the PKs of the children; those children live in the same index
/// under their own PKs. Every other field, embedded or not, is kept verbatim
/// in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
  #[serde(rename = "PK")]
  pub pk:                  Pk,
  /// Raw discriminant. Usually one of the [`ItemType`] strings.
  pub item_type:           String,
  #[serde(
    rename = "familyIncluded",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub family_included:     Option<Vec<Pk>>,
  #[serde(
    rename = "individualIncluded",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub individual_included: Option<Vec<Pk>>,
  #[serde(flatten)]
  pub fields:              Map<String, Value>,
}

impl Evidence {
  /// The typed kind, if `item_type` is one the store knows about.
  pub fn kind(&self) -> Option<ItemType> { self.item_type.parse().ok() }

  /// Look up a preserved field by its wire name.
  pub fn field(&self, key: &str) -> Option<&Value> { self.fields.get(key) }
}

// ─── Variant ─────────────────────────────────────────────────────────────────

/// A variant as seen from one annotation, with the PKs of every evidence in
/// that annotation that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
  #[serde(rename = "PK")]
  pub pk:                   Pk,
  #[serde(flatten)]
  pub fields:               Map<String, Value>,
  /// Referencing evidence PKs in the order the references were met.
  #[serde(rename = "associatedEvidences", default)]
  pub associated_evidences: Vec<Pk>,
}

impl Variant {
  /// Build from a raw variant object first referenced by `evidence_pk`.
  /// Returns `None` if the object carries no string `PK`.
  pub fn from_reference(raw: &Map<String, Value>, evidence_pk: &str) -> Option<Self> {
    let pk = raw.get("PK")?.as_str()?.to_owned();
    let mut fields = raw.clone();
    fields.remove("PK");
    fields.remove("associatedEvidences");
    Some(Self {
      pk,
      fields,
      associated_evidences: vec![evidence_pk.to_owned()],
    })
  }
}

// ─── Raw JSON helpers ────────────────────────────────────────────────────────

/// The string `PK` of a raw record, if it has one.
pub fn pk_of(value: &Value) -> Option<&str> { value.get("PK")?.as_str() }

/// Decode a backend annotation-list body into raw annotation objects.
///
/// The body must be a JSON array; individual elements are not validated here,
/// the collector tolerates whatever they contain.
pub fn decode_annotations(body: &str) -> Result<Vec<Value>> {
  match serde_json::from_str::<Value>(body)? {
    Value::Array(items) => Ok(items),
    _ => Err(Error::NotAnArray),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn item_type_strings_match_backend() {
    let names: Vec<&'static str> = ItemType::iter().map(Into::into).collect();
    assert_eq!(names, [
      "group",
      "family",
      "individual",
      "caseControl",
      "experimental"
    ]);
    assert_eq!(ItemType::parse("caseControl").unwrap(), ItemType::CaseControl);
    assert!(matches!(
      ItemType::parse("case_control"),
      Err(Error::UnknownItemType(_))
    ));
  }

  #[test]
  fn evidence_serializes_with_wire_names() {
    let evidence = Evidence {
      pk:                  "G1".into(),
      item_type:           "group".into(),
      family_included:     Some(vec!["F1".into()]),
      individual_included: Some(vec![]),
      fields:              json!({ "label": "cohort" })
        .as_object()
        .cloned()
        .unwrap(),
    };
    let value = serde_json::to_value(&evidence).unwrap();
    assert_eq!(
      value,
      json!({
        "PK": "G1",
        "item_type": "group",
        "familyIncluded": ["F1"],
        "individualIncluded": [],
        "label": "cohort",
      })
    );
  }

  #[test]
  fn variant_from_reference_strips_stale_associations() {
    let raw = json!({ "PK": "V1", "preferredTitle": "c.1A>G", "associatedEvidences": ["X"] });
    let variant = Variant::from_reference(raw.as_object().unwrap(), "I1").unwrap();
    assert_eq!(variant.pk, "V1");
    assert_eq!(variant.associated_evidences, ["I1"]);
    assert!(!variant.fields.contains_key("associatedEvidences"));
    assert_eq!(variant.fields["preferredTitle"], "c.1A>G");
  }

  #[test]
  fn variant_without_pk_is_rejected() {
    let raw = json!({ "preferredTitle": "orphan" });
    assert!(Variant::from_reference(raw.as_object().unwrap(), "I1").is_none());
  }

  #[test]
  fn decode_annotations_requires_array() {
    assert_eq!(decode_annotations(r#"[{"PK":"A1"}]"#).unwrap().len(), 1);
    assert!(matches!(decode_annotations("null"), Err(Error::NotAnArray)));
    assert!(matches!(
      decode_annotations("{"),
      Err(Error::Serialization(_))
    ));
  }
}
