//! Error types for `curation-core`.
//!
//! The reducer itself never fails; these errors come from decoding input at
//! the boundary and from the snapshot seam.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("annotation payload is not a JSON array")]
  NotAnArray,

  #[error("unknown evidence item type: {0:?}")]
  UnknownItemType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
