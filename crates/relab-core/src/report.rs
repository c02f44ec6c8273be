//! Run report: the machine-readable summary of one reproduction run

use crate::extract::ErrorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalCondition {
    /// An attempt ran clean
    Succeeded,
    /// Attempt ceiling reached without a clean run
    Exhausted,
    /// The initial document could not be produced
    GenerationFailed,
    /// The execution environment could not be launched
    SandboxUnavailable,
    /// A repair proposal was unusable (unparseable or out of bounds)
    FixRejected,
}

/// Summary of one execution attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    /// Attempt number, starting at 1
    pub iteration: u32,
    /// Whether the attempt ran clean
    pub success: bool,
    /// Process exit code
    pub exit_code: i32,
    /// Wall-clock seconds the attempt took
    pub execution_time_secs: f64,
    /// Extracted failure, when the attempt failed
    pub error: Option<ErrorRecord>,
}

/// Machine-readable summary of one run, persisted as `run_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: String,
    /// Experiment this run reproduced
    pub experiment_id: String,
    /// True when the run ended in `Succeeded`
    pub success: bool,
    /// Why the run stopped
    pub terminal: TerminalCondition,
    /// Execution attempts consumed (0 when generation failed)
    pub iterations: u32,
    /// Per-attempt summaries, in order
    pub attempts: Vec<AttemptSummary>,
    /// Artifacts collected across attempts
    pub artifacts: Vec<PathBuf>,
    /// Terminal error note for non-success conditions
    pub error: Option<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Total wall-clock seconds
    pub total_time_secs: f64,
}

impl RunReport {
    /// Serialize for persistence
    ///
    /// # Errors
    /// Serializer faults only.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_terminal_condition_snake_case() {
        let report = RunReport {
            run_id: "01J0000000000000000000000".to_string(),
            experiment_id: "exp-1".to_string(),
            success: false,
            terminal: TerminalCondition::SandboxUnavailable,
            iterations: 1,
            attempts: Vec::new(),
            artifacts: Vec::new(),
            error: Some("docker daemon not running".to_string()),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            total_time_secs: 0.5,
        };
        let value: serde_json::Value =
            serde_json::from_slice(&report.to_bytes().unwrap()).unwrap();
        assert_eq!(value["terminal"], "sandbox_unavailable");
        assert_eq!(value["success"], false);
    }
}
