//! Error extraction from a failed execution attempt
//!
//! Turns raw sandbox output into a structured record the repair prompt can
//! use. Extraction is total: it always produces a record, degrading to
//! `"Unknown"` and the last executable cell when the output carries no
//! recognizable Python failure.

use once_cell::sync::Lazy;
use regex::Regex;
use relab_document::Document;
use relab_sandbox::ExecutionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ceiling on retained traceback text, keeping the tail (the frames nearest
/// the failure are at the end of a Python traceback)
pub const TRACEBACK_LIMIT: usize = 4000;

/// Last `SomeError: message` line of a Python traceback
static EXCEPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*(?:Error|Exception|Interrupt|SystemExit))\s*:\s?(.*)$",
    )
    .unwrap()
});

/// Failing-cell source block as nbclient reports it
static CELL_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)error occurred while executing the following cell:\s*\n-+\n(.*?)\n-+\n")
        .unwrap()
});

/// Structured description of one execution failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Exception type ("NameError", "Timeout", "Unknown")
    pub error_type: String,
    /// Exception message, or the raw output when nothing matched
    pub message: String,
    /// Trimmed traceback text, tail-biased
    pub traceback: String,
    /// Index of the attributed cell, when one could be attributed
    pub cell_index: Option<usize>,
    /// Source of the attributed cell (empty when none)
    pub cell_source: String,
}

/// Extract a structured error record from a failed attempt
///
/// Attribution order: the first cell whose captured outputs record an
/// exception (available when `document` is the executed snapshot), then the
/// failing-cell block in the execution output, then the last executable
/// cell of the document.
#[must_use]
pub fn extract_error(result: &ExecutionResult, document: &Document) -> ErrorRecord {
    let combined = if result.stderr.trim().is_empty() {
        result.stdout.as_str()
    } else {
        result.stderr.as_str()
    };

    if let Some(record) = from_cell_outputs(document, combined) {
        tracing::debug!(
            error_type = %record.error_type,
            cell = ?record.cell_index,
            "extracted error from captured cell outputs"
        );
        return record;
    }

    let (error_type, message) = classify(result, combined);
    let traceback = trim_traceback(combined);
    let cell_index = attribute_cell(combined, document);
    let cell_source = cell_index
        .and_then(|i| document.cells.get(i))
        .map(|c| c.source().as_text())
        .unwrap_or_default();

    tracing::debug!(%error_type, ?cell_index, "extracted execution error");

    ErrorRecord {
        error_type,
        message,
        traceback,
        cell_index,
        cell_source,
    }
}

/// Record built from the first executable cell carrying an error output
fn from_cell_outputs(document: &Document, combined: &str) -> Option<ErrorRecord> {
    let (index, output) = document
        .cells
        .iter()
        .enumerate()
        .find_map(|(i, cell)| {
            cell.outputs()
                .iter()
                .find(|out| out.get("output_type").and_then(Value::as_str) == Some("error"))
                .map(|out| (i, out))
        })?;

    let error_type = output
        .get("ename")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();
    let message = output
        .get("evalue")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let captured = output
        .get("traceback")
        .and_then(Value::as_array)
        .map(|lines| {
            lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    let traceback = if captured.trim().is_empty() {
        trim_traceback(combined)
    } else {
        trim_traceback(&captured)
    };

    Some(ErrorRecord {
        error_type,
        message,
        traceback,
        cell_index: Some(index),
        cell_source: document.cells[index].source().as_text(),
    })
}

fn classify(result: &ExecutionResult, combined: &str) -> (String, String) {
    if result.is_timeout() {
        return ("Timeout".to_string(), result.stderr.trim().to_string());
    }

    if let Some(captures) = EXCEPTION_RE.captures_iter(combined).last() {
        let error_type = captures[1].to_string();
        let message = captures[2].trim().to_string();
        return (error_type, message);
    }

    // no recognizable signature: surface the raw output as the message
    let raw = combined.trim();
    let message = if raw.is_empty() {
        format!("execution failed with exit code {}", result.exit_code)
    } else {
        raw.to_string()
    };
    ("Unknown".to_string(), message)
}

/// Keep the traceback region, trimmed from the front to `TRACEBACK_LIMIT`
fn trim_traceback(combined: &str) -> String {
    let region = combined
        .rfind("Traceback (most recent call last)")
        .map_or(combined, |start| &combined[start..]);
    let region = region.trim();

    if region.len() <= TRACEBACK_LIMIT {
        return region.to_string();
    }
    let mut start = region.len() - TRACEBACK_LIMIT;
    while !region.is_char_boundary(start) {
        start += 1;
    }
    region[start..].to_string()
}

fn attribute_cell(combined: &str, document: &Document) -> Option<usize> {
    if let Some(captures) = CELL_BLOCK_RE.captures(combined) {
        let reported = captures[1].trim();
        let found = document
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_executable())
            .find(|(_, c)| c.source().as_text().trim() == reported)
            .map(|(i, _)| i);
        if found.is_some() {
            return found;
        }
    }
    document.last_executable_index()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use relab_document::{assemble, Cell};
    use relab_sandbox::ExecutionResult;

    fn doc() -> Document {
        assemble(vec![
            Cell::narrative("# Experiment"),
            Cell::executable("import numpy as np\n"),
            Cell::executable("model.fit(x)\n"),
        ])
    }

    #[test]
    fn captured_cell_error_output_wins_attribution() {
        let failing: relab_document::Cell = serde_json::from_value(serde_json::json!({
            "cell_type": "code",
            "metadata": {},
            "execution_count": 2,
            "outputs": [{
                "output_type": "error",
                "ename": "ZeroDivisionError",
                "evalue": "division by zero",
                "traceback": ["Traceback (most recent call last):", "ZeroDivisionError: division by zero"]
            }],
            "source": ["ratio = 1 / 0\n"]
        }))
        .unwrap();
        let document = assemble(vec![
            Cell::narrative("# Experiment"),
            failing,
            Cell::executable("print(ratio)\n"),
        ]);

        let result = ExecutionResult::failed(1, "aggregate stderr without a traceback");
        let record = extract_error(&result, &document);
        assert_eq!(record.error_type, "ZeroDivisionError");
        assert_eq!(record.message, "division by zero");
        assert_eq!(record.cell_index, Some(1));
        assert_eq!(record.cell_source, "ratio = 1 / 0\n");
        assert!(record.traceback.contains("ZeroDivisionError"));
    }

    #[test]
    fn classifies_and_attributes_nbclient_failure() {
        let stderr = "\
An error occurred while executing the following cell:\n\
------------------\n\
import numpy as np\n\
------------------\n\
\n\
Traceback (most recent call last):\n  File \"<cell>\", line 1\n\
ModuleNotFoundError: No module named 'numpy'\n";
        let result = ExecutionResult::failed(1, stderr);
        let record = extract_error(&result, &doc());

        assert_eq!(record.error_type, "ModuleNotFoundError");
        assert_eq!(record.message, "No module named 'numpy'");
        assert_eq!(record.cell_index, Some(1));
        assert!(record.cell_source.contains("import numpy"));
        assert!(record.traceback.starts_with("Traceback"));
    }

    #[test]
    fn unmatched_cell_block_falls_back_to_last_executable() {
        let stderr = "Traceback (most recent call last):\nValueError: bad shape\n";
        let record = extract_error(&ExecutionResult::failed(1, stderr), &doc());
        assert_eq!(record.error_type, "ValueError");
        assert_eq!(record.cell_index, Some(2));
        assert_eq!(record.cell_source, "model.fit(x)\n");
    }

    #[test]
    fn timeout_is_its_own_type() {
        let result = ExecutionResult::timed_out(std::time::Duration::from_secs(60));
        let record = extract_error(&result, &doc());
        assert_eq!(record.error_type, "Timeout");
        assert!(record.message.contains("execution timed out"));
        assert_eq!(record.cell_index, Some(2));
    }

    #[test]
    fn unrecognized_output_degrades_to_unknown() {
        let record = extract_error(&ExecutionResult::failed(137, "Killed\n"), &doc());
        assert_eq!(record.error_type, "Unknown");
        assert_eq!(record.message, "Killed");

        let silent = extract_error(&ExecutionResult::failed(9, ""), &doc());
        assert_eq!(silent.message, "execution failed with exit code 9");
    }

    #[test]
    fn unknown_failures_carry_the_whole_raw_output() {
        let stderr = "container event: oom\nKilled\n";
        let record = extract_error(&ExecutionResult::failed(137, stderr), &doc());
        assert_eq!(record.error_type, "Unknown");
        assert_eq!(record.message, "container event: oom\nKilled");
    }

    #[test]
    fn long_tracebacks_keep_the_tail() {
        let filler = "  File \"frame.py\", line 1, in f\n".repeat(400);
        let stderr = format!(
            "Traceback (most recent call last):\n{filler}KeyError: 'final frame'\n"
        );
        let record = extract_error(&ExecutionResult::failed(1, stderr), &doc());
        assert!(record.traceback.len() <= TRACEBACK_LIMIT);
        assert!(record.traceback.ends_with("KeyError: 'final frame'"));
        assert_eq!(record.error_type, "KeyError");
    }

    #[test]
    fn stdout_is_consulted_when_stderr_is_empty() {
        let mut result = ExecutionResult::failed(1, "");
        result.stdout = "RuntimeError: device unavailable\n".to_string();
        let record = extract_error(&result, &doc());
        assert_eq!(record.error_type, "RuntimeError");
    }
}
