//! Initial document generation
//!
//! The collaborator answers the generation prompt with free text that should
//! contain one JSON object of the form
//! `{"cells": [{"cell_type": "markdown" | "code", "source": ...}]}`.
//! Parsing is tolerant about where the JSON sits in the text and about
//! source being a string or a line list, and strict about everything else.

use crate::error::GenerationError;
use relab_document::{Cell, SourceText};
use relab_llm::extract_first_json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CellsPayload {
    cells: Vec<CellPayload>,
}

#[derive(Debug, Deserialize)]
struct CellPayload {
    cell_type: PayloadKind,
    source: SourceText,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PayloadKind {
    Markdown,
    Code,
}

/// Parse a generation response into an ordered cell sequence
///
/// # Errors
/// - `GenerationError::Response` when no JSON is present
/// - `GenerationError::Malformed` when the JSON has the wrong shape
/// - `GenerationError::EmptyCells` / `NoExecutableCells` on degenerate output
pub fn parse_cells(response: &str) -> Result<Vec<Cell>, GenerationError> {
    let value = extract_first_json(response)?;
    let payload: CellsPayload = serde_json::from_value(value)?;

    if payload.cells.is_empty() {
        return Err(GenerationError::EmptyCells);
    }

    let cells: Vec<Cell> = payload
        .cells
        .into_iter()
        .map(|cell| {
            let text = cell.source.as_text();
            match cell.cell_type {
                PayloadKind::Markdown => Cell::narrative(&text),
                PayloadKind::Code => Cell::executable(&text),
            }
        })
        .collect();

    if !cells.iter().any(Cell::is_executable) {
        return Err(GenerationError::NoExecutableCells);
    }

    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relab_document::CellKind;
    use serde_json::json;

    #[test]
    fn parses_fenced_cell_payload() {
        let response = format!(
            "Here is the notebook:\n```json\n{}\n```",
            json!({"cells": [
                {"cell_type": "markdown", "source": "# Title"},
                {"cell_type": "code", "source": "x = 1\nprint(x)\n"}
            ]})
        );
        let cells = parse_cells(&response).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].kind(), CellKind::Narrative);
        assert_eq!(cells[1].source().as_text(), "x = 1\nprint(x)\n");
    }

    #[test]
    fn accepts_line_list_sources() {
        let response = json!({"cells": [
            {"cell_type": "code", "source": ["import os\n", "print(os.getcwd())\n"]}
        ]})
        .to_string();
        let cells = parse_cells(&response).unwrap();
        assert_eq!(cells[0].source().as_text(), "import os\nprint(os.getcwd())\n");
    }

    #[test]
    fn rejects_empty_and_prose_only_payloads() {
        assert!(matches!(
            parse_cells(r#"{"cells": []}"#),
            Err(GenerationError::EmptyCells)
        ));
        assert!(matches!(
            parse_cells(r#"{"cells": [{"cell_type": "markdown", "source": "just prose"}]}"#),
            Err(GenerationError::NoExecutableCells)
        ));
    }

    #[test]
    fn rejects_prose_without_json() {
        assert!(matches!(
            parse_cells("I could not produce a notebook, sorry."),
            Err(GenerationError::Response(_))
        ));
    }

    #[test]
    fn rejects_unknown_cell_kinds() {
        let response = json!({"cells": [{"cell_type": "raw", "source": "x"}]}).to_string();
        assert!(matches!(
            parse_cells(&response),
            Err(GenerationError::Malformed(_))
        ));
    }
}
