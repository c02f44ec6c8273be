//! Fixed prompt templates
//!
//! Three templates, parameterized and rendered here so every caller sends
//! byte-identical scaffolding. Payloads are passed as already-serialized JSON
//! to keep this crate a leaf (the structured types live upstream).

use crate::model::{LmRequest, PromptKind};

const DECOMPOSE_TEMPLATE: &str = r#"You are given one chunk of an academic paper. Extract its structure as a single JSON object with this shape:

{
  "title": string or null,
  "authors": [string],
  "abstract": string or null,
  "sections": [{"id": string, "heading": string, "summary": string}],
  "experiments": [{
    "id": string,
    "title": string,
    "description": string,
    "dataset": {"name": string, "source": string, "size": string, "synthetic": boolean},
    "input_shape": string,
    "output_shape": string,
    "model": {"kind": string, "architecture": string, "framework": string},
    "hyperparameters": {string: string or number},
    "metrics": [string],
    "figures": [string]
  }],
  "reproducibility": {"difficulty": "low" | "medium" | "high", "estimated_effort_hours": number, "notes": string}
}

Leave fields null or empty when the chunk does not mention them. Output ONLY the JSON object."#;

const GENERATION_TEMPLATE: &str = r#"Write a self-contained Jupyter notebook that reproduces the experiment described below. Respond with a single JSON object:

{
  "cells": [
    {"cell_type": "markdown" | "code", "source": string},
    ...
  ]
}

Rules:
- The notebook must run top to bottom without user input.
- Start with a markdown cell summarizing the experiment.
- Import everything you use; install nothing interactively.
- Print the reported metrics at the end.
- Output ONLY the JSON object."#;

const SYNTHETIC_DATA_NOTE: &str = "\n\n**IMPORTANT: synthetic-data mode. \
Generate synthetic datasets in-notebook. Do NOT download real datasets.**";

const FIX_TEMPLATE: &str = r#"A notebook cell failed during execution. Propose replacement source for the failing cell (and, only if strictly necessary, for other cells). Respond with a single JSON object:

{
  "analysis": string,
  "cells": [{"cell_index": number, "source": string}]
}

Keep untouched cells out of the response. Output ONLY the JSON object."#;

/// Render the per-chunk decomposition extraction prompt
#[must_use]
pub fn decompose_prompt(chunk: &str) -> LmRequest {
    let prompt = format!("{DECOMPOSE_TEMPLATE}\n\n---\n\nPaper text:\n\n{chunk}");
    LmRequest::new(PromptKind::Decompose, prompt)
}

/// Render a decomposition reprompt after a malformed response
///
/// Same chunk, same template, plus a JSON-only reminder so the retry budget
/// is spent on the model correcting itself rather than on identical calls.
#[must_use]
pub fn decompose_reprompt(chunk: &str, parse_failure: &str) -> LmRequest {
    let prompt = format!(
        "{DECOMPOSE_TEMPLATE}\n\nYour previous response was not valid JSON \
         ({parse_failure}). Output ONLY valid JSON with no additional text.\
         \n\n---\n\nPaper text:\n\n{chunk}"
    );
    LmRequest::new(PromptKind::Decompose, prompt)
}

/// Render the notebook generation prompt
///
/// `experiment_json` is the serialized experiment description;
/// `synthetic_data` appends the synthetic-data directive.
#[must_use]
pub fn generation_prompt(experiment_json: &str, synthetic_data: bool) -> LmRequest {
    let note = if synthetic_data { SYNTHETIC_DATA_NOTE } else { "" };
    let prompt = format!(
        "{GENERATION_TEMPLATE}{note}\n\n---\n\nExperiment specification:\n\n{experiment_json}"
    );
    LmRequest::new(PromptKind::GenerateNotebook, prompt)
}

/// Context handed to the repair prompt
#[derive(Debug, Clone, Default)]
pub struct RepairContext {
    /// Source of the failing cell
    pub failing_source: String,
    /// Extracted error text (type, message, trimmed traceback)
    pub error_text: String,
    /// Up to two cells preceding the failure, already formatted
    pub previous_cells: String,
    /// Up to two cells following the failure, already formatted
    pub following_cells: String,
}

/// Render the cell repair prompt
#[must_use]
pub fn repair_prompt(ctx: &RepairContext) -> LmRequest {
    let previous = if ctx.previous_cells.is_empty() {
        "None"
    } else {
        &ctx.previous_cells
    };
    let following = if ctx.following_cells.is_empty() {
        "None"
    } else {
        &ctx.following_cells
    };
    let prompt = format!(
        "{FIX_TEMPLATE}\n\n---\n\nFailing cell:\n\n{}\n\nError:\n\n{}\n\n\
         Preceding cells:\n\n{previous}\n\nFollowing cells:\n\n{following}",
        ctx.failing_source, ctx.error_text
    );
    LmRequest::new(PromptKind::FixNotebook, prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_prompt_embeds_chunk() {
        let req = decompose_prompt("chunk body text");
        assert_eq!(req.kind, PromptKind::Decompose);
        assert!(req.prompt.contains("chunk body text"));
        assert!(req.prompt.contains("reproducibility"));
    }

    #[test]
    fn generation_prompt_mode_flag() {
        let with = generation_prompt("{}", true);
        let without = generation_prompt("{}", false);
        assert!(with.prompt.contains("synthetic-data mode"));
        assert!(!without.prompt.contains("synthetic-data mode"));
    }

    #[test]
    fn repair_prompt_empty_context_renders_none() {
        let ctx = RepairContext {
            failing_source: "x = undefined".to_string(),
            error_text: "NameError: name 'undefined' is not defined".to_string(),
            ..Default::default()
        };
        let req = repair_prompt(&ctx);
        assert_eq!(req.kind, PromptKind::FixNotebook);
        assert!(req.prompt.contains("Preceding cells:\n\nNone"));
        assert!(req.prompt.contains("NameError"));
    }
}
