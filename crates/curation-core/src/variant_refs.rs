//! Reading variant references out of an evidence record.
//!
//! Two schema generations coexist in stored data. Before SOPv8 an evidence
//! embedded its variants directly (`variants`, or `segregation.variants` on a
//! family). From SOPv8 on, individuals wrap each variant in a score record
//! (`variantScores[].variantScored`), and records written in between may carry
//! both. [`VariantRefs`] is the one place that knows about either shape.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::model::{ItemType, pk_of};

static MISSING: Value = Value::Null;

/// Where a given kind of evidence keeps its variant references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantLayout {
  /// A top-level `variants` array.
  Embedded,
  /// `segregation.variants`, used by families.
  Segregation,
  /// `variantScores[].variantScored` plus any legacy `variants`.
  Scored,
}

impl From<ItemType> for VariantLayout {
  fn from(kind: ItemType) -> Self {
    match kind {
      ItemType::Individual => Self::Scored,
      ItemType::Family => Self::Segregation,
      ItemType::Group | ItemType::CaseControl | ItemType::Experimental => {
        Self::Embedded
      }
    }
  }
}

/// The variant references found on one evidence record.
#[derive(Debug, Clone)]
pub enum VariantRefs<'a> {
  /// Pre-SOPv8 references: the embedded variant objects as-is.
  Embedded(&'a [Value]),
  /// SOPv8 references: the scored variants, followed by the legacy embedded
  /// variants left on the same record whose PK is not already scored. The
  /// two lists are unioned; neither replaces the other.
  Scored {
    scored: Vec<&'a Value>,
    legacy: Vec<&'a Value>,
  },
}

impl<'a> VariantRefs<'a> {
  /// Read the references of `evidence` according to `layout`. Absent or
  /// non-array fields read as empty.
  pub fn read(evidence: &'a Map<String, Value>, layout: VariantLayout) -> Self {
    match layout {
      VariantLayout::Embedded => Self::Embedded(array_at(evidence.get("variants"))),
      VariantLayout::Segregation => Self::Embedded(array_at(
        evidence.get("segregation").and_then(|s| s.get("variants")),
      )),
      VariantLayout::Scored => {
        let scored: Vec<&'a Value> = array_at(evidence.get("variantScores"))
          .iter()
          .map(|score| score.get("variantScored").unwrap_or(&MISSING))
          .collect();
        let scored_pks: HashSet<&str> = scored.iter().filter_map(|v| pk_of(*v)).collect();
        let legacy = array_at(evidence.get("variants"))
          .iter()
          .filter(|v| pk_of(*v).is_none_or(|pk| !scored_pks.contains(pk)))
          .collect();
        Self::Scored { scored, legacy }
      }
    }
  }

  /// Every reference in reading order. Entries are not validated; callers
  /// must skip anything that is not a variant object.
  pub fn iter(&self) -> Box<dyn Iterator<Item = &'a Value> + '_> {
    match self {
      Self::Embedded(variants) => Box::new((*variants).iter()),
      Self::Scored { scored, legacy } => Box::new(scored.iter().chain(legacy.iter()).copied()),
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Self::Embedded(variants) => variants.is_empty(),
      Self::Scored { scored, legacy } => scored.is_empty() && legacy.is_empty(),
    }
  }
}

fn array_at(value: Option<&Value>) -> &[Value] {
  value
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or_default()
}
