//! Error types for decomposition

use crate::types::PaperDecomposition;
use relab_llm::LmError;

/// Schema validation failure listing every violated field
#[derive(Debug, thiserror::Error)]
#[error("schema validation failed: {}", violations.join("; "))]
pub struct SchemaError {
    /// All violations found, in field order
    pub violations: Vec<String>,
}

/// Errors from the extraction/merge pipeline
#[derive(Debug, thiserror::Error)]
pub enum DecomposeError {
    /// No chunk produced parseable data within the retry budget
    #[error("no chunk produced valid structured data")]
    NoData,

    /// Language-model transport failure
    #[error("language model failed: {0}")]
    Lm(#[from] LmError),

    /// Merged result violates the schema; the partial result is attached so
    /// the caller can decide whether to accept it anyway
    #[error("merged decomposition invalid: {source}")]
    Schema {
        /// The violations
        #[source]
        source: SchemaError,
        /// The merged-but-invalid decomposition
        partial: Box<PaperDecomposition>,
    },
}
