//! Core types and the evidence normalization store for curation annotations.
//!
//! This crate is deliberately free of HTTP and database dependencies. It takes
//! raw nested annotation JSON, as served by the curation backend, and keeps a
//! flat, PK-indexed view of every evidence and variant it embeds. All other
//! crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod action;
pub mod collect;
pub mod error;
pub mod model;
pub mod reducer;
pub mod state;
pub mod store;
pub mod variant_refs;

pub use action::AnnotationAction;
pub use error::{Error, Result};
pub use model::{Evidence, ItemType, Pk, Variant};
pub use reducer::reduce;
pub use state::{AnnotationIndex, AnnotationsState};
pub use store::{AnnotationStore, Snapshot, SnapshotStore};
