//! Deterministic document segmentation (spec §4.A, component A).
//!
//! `segment()` is the only entry point most callers need: raw document
//! text in, an ordered list of [`SemanticUnit`] out. Everything else in
//! this crate is an implementation detail of that pipeline, exposed for
//! testing and for the assignment engine that consumes its types.

mod error;
mod grouping;
mod headings;
mod pipeline;
mod sections;
mod types;

pub use error::SegmentError;
pub use grouping::{
    DEFAULT_MAX_GROUP_SIZE, DEFAULT_MIN_GROUP_SIZE, DEFAULT_SIMILARITY_THRESHOLD, cosine_similarity,
};
pub use headings::{Heading, detect_headings};
pub use pipeline::{SegmentConfig, segment};
pub use sections::{Section, split_sections};
pub use types::SemanticUnit;
