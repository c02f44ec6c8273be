//! Document: ordered cells plus format-version metadata
//!
//! The serialized form is the compatibility surface with the sandbox and
//! with standard notebook tooling: nbformat v4 JSON, cells in order, source
//! in line-list form.

use crate::cell::Cell;
use crate::error::DocumentError;
use crate::fix::FixRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Major format version this crate writes
pub const NBFORMAT: u32 = 4;
/// Minor format version this crate writes
pub const NBFORMAT_MINOR: u32 = 5;

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A runnable document: ordered cells + format metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Ordered cells (order is semantically meaningful)
    pub cells: Vec<Cell>,
    /// Notebook-level metadata (opaque, preserved)
    #[serde(default = "empty_object")]
    pub metadata: Value,
    /// Major format version
    pub nbformat: u32,
    /// Minor format version
    pub nbformat_minor: u32,
}

/// Wrap cells with format metadata; deterministic, no I/O
#[must_use]
pub fn assemble(cells: Vec<Cell>) -> Document {
    Document {
        cells,
        metadata: empty_object(),
        nbformat: NBFORMAT,
        nbformat_minor: NBFORMAT_MINOR,
    }
}

impl Document {
    /// Serialize to nbformat JSON bytes
    ///
    /// # Errors
    /// `DocumentError::Malformed` only on a serializer fault; the model is
    /// always representable.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Deserialize from nbformat JSON bytes
    ///
    /// # Errors
    /// - `DocumentError::Malformed` when the bytes are not a cell document
    /// - `DocumentError::UnsupportedVersion` for non-v4 documents
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let doc: Document = serde_json::from_slice(bytes)?;
        if doc.nbformat != NBFORMAT {
            return Err(DocumentError::UnsupportedVersion {
                found: doc.nbformat,
                expected: NBFORMAT,
            });
        }
        Ok(doc)
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the document has no cells
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Indices of executable cells, in document order
    #[must_use]
    pub fn executable_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_executable())
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the last executable cell, if any
    #[must_use]
    pub fn last_executable_index(&self) -> Option<usize> {
        self.cells.iter().rposition(Cell::is_executable)
    }

    /// Apply a fix record, replacing the source of the targeted cells only
    ///
    /// All targets are bounds-checked before any mutation, so a failed patch
    /// leaves the document bit-identical to its input.
    ///
    /// # Errors
    /// - `DocumentError::EmptyFix` when the record carries no replacements
    /// - `DocumentError::IndexOutOfBounds` when any target is out of range
    pub fn apply_fix(&mut self, fix: &FixRecord) -> Result<(), DocumentError> {
        if fix.cells.is_empty() {
            return Err(DocumentError::EmptyFix);
        }
        for cell_fix in &fix.cells {
            if cell_fix.cell_index >= self.cells.len() {
                return Err(DocumentError::IndexOutOfBounds {
                    index: cell_fix.cell_index,
                    len: self.cells.len(),
                });
            }
        }
        for cell_fix in &fix.cells {
            self.cells[cell_fix.cell_index].set_source(&cell_fix.source);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::CellFix;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn three_cell_doc() -> Document {
        assemble(vec![
            Cell::narrative("# Experiment\nSetup notes"),
            Cell::executable("import numpy as np\n"),
            Cell::executable("print(np.zeros(3))\n"),
        ])
    }

    #[test]
    fn assemble_sets_format_versions() {
        let doc = three_cell_doc();
        assert_eq!(doc.nbformat, 4);
        assert_eq!(doc.nbformat_minor, 5);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn round_trip_is_exact() {
        let doc = three_cell_doc();
        let bytes = doc.to_bytes().unwrap();
        let back = Document::from_bytes(&bytes).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn serialized_form_is_notebook_compatible() {
        let doc = three_cell_doc();
        let value: Value = serde_json::from_slice(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(value["nbformat"], json!(4));
        assert!(value["metadata"].is_object());
        assert_eq!(value["cells"][0]["cell_type"], json!("markdown"));
        assert_eq!(value["cells"][1]["cell_type"], json!("code"));
        assert!(value["cells"][1]["source"].is_array());
    }

    #[test]
    fn rejects_unsupported_version() {
        let raw = json!({"cells": [], "metadata": {}, "nbformat": 3, "nbformat_minor": 0});
        let err = Document::from_bytes(raw.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion { found: 3, .. }));
    }

    #[test]
    fn apply_fix_is_localized() {
        let mut doc = three_cell_doc();
        let before = doc.clone();
        doc.apply_fix(&FixRecord::single(2, "print(np.ones(3))\n"))
            .unwrap();

        assert_eq!(doc.cells[0], before.cells[0]);
        assert_eq!(doc.cells[1], before.cells[1]);
        assert_eq!(doc.cells[2].source().as_text(), "print(np.ones(3))\n");
    }

    #[test]
    fn apply_fix_multiple_targets() {
        let mut doc = three_cell_doc();
        let fix = FixRecord {
            analysis: None,
            cells: vec![
                CellFix { cell_index: 1, source: "import numpy as np\nimport os\n".into() },
                CellFix { cell_index: 2, source: "print(os.getcwd())\n".into() },
            ],
        };
        doc.apply_fix(&fix).unwrap();
        assert!(doc.cells[1].source().as_text().contains("import os"));
        assert!(doc.cells[2].source().as_text().contains("getcwd"));
    }

    #[test]
    fn out_of_bounds_fix_leaves_document_untouched() {
        let mut doc = three_cell_doc();
        let before = doc.clone();
        let fix = FixRecord {
            analysis: None,
            cells: vec![
                CellFix { cell_index: 0, source: "changed".into() },
                CellFix { cell_index: 9, source: "oob".into() },
            ],
        };
        let err = doc.apply_fix(&fix).unwrap_err();
        assert!(matches!(err, DocumentError::IndexOutOfBounds { index: 9, len: 3 }));
        assert_eq!(doc, before);
    }

    #[test]
    fn executable_indices_and_last() {
        let doc = three_cell_doc();
        assert_eq!(doc.executable_indices(), vec![1, 2]);
        assert_eq!(doc.last_executable_index(), Some(2));

        let prose_only = assemble(vec![Cell::narrative("just text")]);
        assert_eq!(prose_only.last_executable_index(), None);
    }
}
