//! RELAB Decompose - paper decomposition
//!
//! Turns per-chunk collaborator payloads into one validated
//! `PaperDecomposition`:
//! - per-chunk extraction with a bounded retry budget for malformed JSON
//! - a pure, deterministic merge with explicit tie-break rules
//! - schema validation that reports every violated field at once
//!
//! The merge is unit-testable without any live collaborator; only
//! `DecompositionExtractor` touches the language model.

pub mod error;
pub mod extract;
pub mod merge;
pub mod types;
pub mod validate;

pub use error::{DecomposeError, SchemaError};
pub use extract::DecompositionExtractor;
pub use merge::merge;
pub use types::{
    Assessment, DatasetDescriptor, Difficulty, ExperimentDescription, HyperValue,
    ModelDescriptor, PaperDecomposition, PartialDecomposition, Section,
};
pub use validate::validate;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
