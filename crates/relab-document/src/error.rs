//! Error types for document assembly and patching

/// Errors from document operations
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// A fix targeted a cell index outside the document
    #[error("cell index {index} out of bounds (document has {len} cells)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A fix carried no cell replacements
    #[error("fix record contains no cell replacements")]
    EmptyFix,

    /// The bytes did not parse as a versioned cell document
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document declares an unsupported format version
    #[error("unsupported document format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
