//! Fix records: the repair collaborator's output, parsed and validated

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cell replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFix {
    /// Index of the cell to replace
    pub cell_index: usize,
    /// Replacement source text
    pub source: String,
}

/// A validated repair proposal: one or more cell replacements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRecord {
    /// Collaborator's free-text diagnosis (kept for the trajectory)
    #[serde(default)]
    pub analysis: Option<String>,
    /// Replacements to apply
    pub cells: Vec<CellFix>,
}

impl FixRecord {
    /// Single-cell fix
    #[must_use]
    pub fn single(cell_index: usize, source: impl Into<String>) -> Self {
        Self {
            analysis: None,
            cells: vec![CellFix {
                cell_index,
                source: source.into(),
            }],
        }
    }

    /// Parse a collaborator JSON value into a fix record
    ///
    /// # Errors
    /// - `DocumentError::Malformed` when the shape does not match
    /// - `DocumentError::EmptyFix` when no replacements are present
    pub fn from_json(value: Value) -> Result<Self, DocumentError> {
        let record: FixRecord = serde_json::from_value(value)?;
        if record.cells.is_empty() {
            return Err(DocumentError::EmptyFix);
        }
        Ok(record)
    }
}
