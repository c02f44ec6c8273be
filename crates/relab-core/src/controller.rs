//! Iteration controller: the generate / execute / repair loop
//!
//! One controller run takes an experiment description to a terminal report:
//! - generate the initial document (a generation failure ends the run with
//!   zero execution attempts)
//! - execute in the sandbox; a clean run succeeds, an unavailable sandbox
//!   ends the run immediately (infrastructure is not fixable by patching)
//! - on a retryable failure, extract the error, obtain a repair proposal,
//!   apply it, and execute again, up to the attempt ceiling
//!
//! Every language-model exchange lands in the trajectory; execution
//! attempts are summarized in the report history instead. The document,
//! trajectory, and report are persisted even when the run fails.

use crate::config::RunConfig;
use crate::error::{ControllerError, GenerationError};
use crate::extract::{extract_error, ErrorRecord};
use crate::generate::parse_cells;
use crate::report::{AttemptSummary, RunReport, TerminalCondition};
use crate::state::{RunState, StateTracker};
use crate::trajectory::{Trajectory, LM_ROLE};
use chrono::Utc;
use relab_decompose::ExperimentDescription;
use relab_document::{assemble, Cell, Document, FixRecord};
use relab_llm::prompts::{self, RepairContext};
use relab_llm::{extract_first_json, LanguageModel};
use relab_sandbox::{ExecutionRequest, ExecutionResult, SandboxRuntime};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use ulid::Ulid;

/// Generated document, rewritten in place after each applied fix
pub const NOTEBOOK_FILE: &str = "notebook.ipynb";
/// Executed snapshot written by the sandbox
pub const EXECUTED_FILE: &str = "executed.ipynb";
/// Persisted trajectory
pub const TRAJECTORY_FILE: &str = "trajectory.json";
/// Persisted run report
pub const REPORT_FILE: &str = "run_report.json";
/// Subdirectory for collected artifacts
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Cells of surrounding context shown to the repair prompt, each side
const NEIGHBOR_CONTEXT: usize = 2;

/// Repair proposals are requested at most this many times per failure
const FIX_PARSE_ATTEMPTS: usize = 2;

/// Drives one experiment reproduction to a terminal state
pub struct IterationController {
    lm: Arc<dyn LanguageModel>,
    sandbox: Arc<dyn SandboxRuntime>,
    config: RunConfig,
}

impl IterationController {
    /// Create a controller over the given collaborators
    #[must_use]
    pub fn new(
        lm: Arc<dyn LanguageModel>,
        sandbox: Arc<dyn SandboxRuntime>,
        config: RunConfig,
    ) -> Self {
        Self {
            lm,
            sandbox,
            config,
        }
    }

    /// Run one reproduction to completion and return its report
    ///
    /// A failed reproduction is still an `Ok` report; errors cover only the
    /// controller's own persistence and lifecycle faults.
    ///
    /// # Errors
    /// `ControllerError` on output I/O, serialization, or lifecycle faults.
    pub async fn run(
        &self,
        experiment: &ExperimentDescription,
    ) -> Result<RunReport, ControllerError> {
        self.run_with_trajectory(experiment, Trajectory::new()).await
    }

    /// Run with a trajectory pre-seeded by earlier pipeline exchanges
    ///
    /// # Errors
    /// `ControllerError` on output I/O, serialization, or lifecycle faults.
    pub async fn run_with_trajectory(
        &self,
        experiment: &ExperimentDescription,
        mut trajectory: Trajectory,
    ) -> Result<RunReport, ControllerError> {
        let run_id = Ulid::new().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let mut tracker = StateTracker::new();
        let mut attempts: Vec<AttemptSummary> = Vec::new();
        let mut artifacts: Vec<PathBuf> = Vec::new();
        let mut terminal = TerminalCondition::Exhausted;
        let mut error_note: Option<String> = None;
        let mut iterations = 0u32;

        tracing::info!(%run_id, experiment = %experiment.id, "run started");

        match self.generate(experiment, &mut trajectory).await {
            Err(e) => {
                tracker.advance(RunState::Failed)?;
                terminal = TerminalCondition::GenerationFailed;
                error_note = Some(e.to_string());
            }
            Ok(cells) => {
                let mut document = assemble(cells);
                tracker.advance(RunState::Generated)?;
                self.persist_document(&document).await?;

                'attempts: for iteration in 1..=self.config.max_iterations {
                    tracker.advance(RunState::Executing)?;
                    iterations = iteration;
                    tracing::info!(iteration, max = self.config.max_iterations, "executing");

                    let result = match self.execute(&document).await {
                        Err(reason) => {
                            tracker.advance(RunState::Failed)?;
                            terminal = TerminalCondition::SandboxUnavailable;
                            error_note = Some(reason);
                            break 'attempts;
                        }
                        Ok(result) => result,
                    };
                    merge_artifacts(&mut artifacts, &result.artifacts);

                    if result.success {
                        attempts.push(attempt_summary(iteration, &result, None));
                        tracker.advance(RunState::Succeeded)?;
                        terminal = TerminalCondition::Succeeded;
                        break 'attempts;
                    }

                    let attribution_doc = executed_snapshot(&result)
                        .await
                        .unwrap_or_else(|| document.clone());
                    let record = extract_error(&result, &attribution_doc);
                    tracing::warn!(
                        iteration,
                        error_type = %record.error_type,
                        cell = ?record.cell_index,
                        "attempt failed"
                    );
                    attempts.push(attempt_summary(iteration, &result, Some(record.clone())));
                    tracker.advance(RunState::FailedRetryable)?;

                    if iteration == self.config.max_iterations {
                        tracker.advance(RunState::Exhausted)?;
                        error_note =
                            Some(format!("{}: {}", record.error_type, record.message));
                        break 'attempts;
                    }

                    tracker.advance(RunState::Fixing)?;
                    match self.repair(&document, &record, &mut trajectory).await {
                        Ok(fix) => {
                            if let Err(e) = document.apply_fix(&fix) {
                                tracker.advance(RunState::Failed)?;
                                terminal = TerminalCondition::FixRejected;
                                error_note = Some(e.to_string());
                                break 'attempts;
                            }
                            self.persist_document(&document).await?;
                        }
                        Err(reason) => {
                            tracker.advance(RunState::Failed)?;
                            terminal = TerminalCondition::FixRejected;
                            error_note = Some(reason);
                            break 'attempts;
                        }
                    }
                }
            }
        }

        let report = RunReport {
            run_id,
            experiment_id: experiment.id.clone(),
            success: terminal == TerminalCondition::Succeeded,
            terminal,
            iterations,
            attempts,
            artifacts,
            error: error_note,
            started_at,
            finished_at: Utc::now(),
            total_time_secs: clock.elapsed().as_secs_f64(),
        };
        self.persist_run(&report, &trajectory).await?;

        tracing::info!(
            run_id = %report.run_id,
            success = report.success,
            terminal = ?report.terminal,
            iterations = report.iterations,
            final_state = ?tracker.current(),
            "run finished"
        );
        Ok(report)
    }

    /// Produce the initial cell sequence, recording the exchange
    async fn generate(
        &self,
        experiment: &ExperimentDescription,
        trajectory: &mut Trajectory,
    ) -> Result<Vec<Cell>, GenerationError> {
        let experiment_json = serde_json::to_string_pretty(experiment)?;
        let request =
            prompts::generation_prompt(&experiment_json, self.config.data_mode.is_synthetic());
        let action = request.kind.name();

        match self.lm.complete(request.clone()).await {
            Err(e) => {
                trajectory.record(LM_ROLE, action, &request.prompt, "", format!("error: {e}"));
                Err(e.into())
            }
            Ok(response) => match parse_cells(&response) {
                Ok(cells) => {
                    trajectory.record(LM_ROLE, action, &request.prompt, &response, "ok");
                    tracing::info!(cells = cells.len(), "document generated");
                    Ok(cells)
                }
                Err(e) => {
                    trajectory.record(
                        LM_ROLE,
                        action,
                        &request.prompt,
                        &response,
                        format!("rejected: {e}"),
                    );
                    Err(e)
                }
            },
        }
    }

    /// Run one sandbox attempt
    ///
    /// An unavailable sandbox comes back as `Err(reason)`; the caller treats
    /// it as terminal. Attempts are summarized in the report history, not
    /// the trajectory.
    async fn execute(&self, document: &Document) -> Result<ExecutionResult, String> {
        let request = ExecutionRequest {
            document: document.to_bytes().map_err(|e| e.to_string())?,
            image: self.config.image.clone(),
            limits: self.config.limits,
            timeout: self.config.timeout,
            output_dir: self.config.output_dir.join(ARTIFACTS_DIR),
            executed_path: self.config.output_dir.join(EXECUTED_FILE),
        };
        self.sandbox.execute(request).await.map_err(|e| e.to_string())
    }

    /// Obtain a usable repair proposal, recording every exchange
    ///
    /// An unparseable response is retried once; a transport failure or a
    /// second unusable response ends the run.
    async fn repair(
        &self,
        document: &Document,
        record: &ErrorRecord,
        trajectory: &mut Trajectory,
    ) -> Result<FixRecord, String> {
        let context = repair_context(document, record);
        let request = prompts::repair_prompt(&context);
        let action = request.kind.name();
        let mut last_reason = String::new();

        for _ in 0..FIX_PARSE_ATTEMPTS {
            match self.lm.complete(request.clone()).await {
                Err(e) => {
                    trajectory.record(
                        LM_ROLE,
                        action,
                        &request.prompt,
                        "",
                        format!("error: {e}"),
                    );
                    return Err(format!("repair request failed: {e}"));
                }
                Ok(response) => match parse_fix(&response) {
                    Ok(fix) => {
                        trajectory.record(LM_ROLE, action, &request.prompt, &response, "ok");
                        return Ok(fix);
                    }
                    Err(reason) => {
                        trajectory.record(
                            LM_ROLE,
                            action,
                            &request.prompt,
                            &response,
                            format!("rejected: {reason}"),
                        );
                        last_reason = reason;
                    }
                },
            }
        }
        Err(format!("repair proposal unusable: {last_reason}"))
    }

    async fn persist_document(&self, document: &Document) -> Result<(), ControllerError> {
        let bytes = document.to_bytes()?;
        tokio::fs::write(self.config.output_dir.join(NOTEBOOK_FILE), bytes).await?;
        Ok(())
    }

    async fn persist_run(
        &self,
        report: &RunReport,
        trajectory: &Trajectory,
    ) -> Result<(), ControllerError> {
        tokio::fs::write(
            self.config.output_dir.join(TRAJECTORY_FILE),
            trajectory.to_bytes()?,
        )
        .await?;
        tokio::fs::write(self.config.output_dir.join(REPORT_FILE), report.to_bytes()?).await?;
        Ok(())
    }
}

/// Parse a repair response into a validated fix record
fn parse_fix(response: &str) -> Result<FixRecord, String> {
    let value = extract_first_json(response).map_err(|e| e.to_string())?;
    FixRecord::from_json(value).map_err(|e| e.to_string())
}

/// Build the repair prompt context around the attributed cell
fn repair_context(document: &Document, record: &ErrorRecord) -> RepairContext {
    let error_text = format!(
        "{}: {}\n\n{}",
        record.error_type, record.message, record.traceback
    );
    let (previous_cells, following_cells) = match record.cell_index {
        Some(index) => (
            format_cells(document, index.saturating_sub(NEIGHBOR_CONTEXT), index),
            format_cells(
                document,
                index + 1,
                (index + 1 + NEIGHBOR_CONTEXT).min(document.len()),
            ),
        ),
        None => (String::new(), String::new()),
    };
    RepairContext {
        failing_source: record.cell_source.clone(),
        error_text,
        previous_cells,
        following_cells,
    }
}

fn format_cells(document: &Document, start: usize, end: usize) -> String {
    document.cells[start.min(document.len())..end.min(document.len())]
        .iter()
        .zip(start..)
        .map(|(cell, index)| {
            let kind = if cell.is_executable() { "code" } else { "markdown" };
            format!("[{index}] {kind}:\n{}", cell.source().as_text())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn attempt_summary(
    iteration: u32,
    result: &ExecutionResult,
    error: Option<ErrorRecord>,
) -> AttemptSummary {
    AttemptSummary {
        iteration,
        success: result.success,
        exit_code: result.exit_code,
        execution_time_secs: result.execution_time.as_secs_f64(),
        error,
    }
}

fn merge_artifacts(into: &mut Vec<PathBuf>, new: &[PathBuf]) {
    for path in new {
        if !into.contains(path) {
            into.push(path.clone());
        }
    }
}

/// Parse the executed snapshot, when the sandbox produced one
///
/// The snapshot carries per-cell captured outputs, which give the error
/// extractor exact attribution. Unreadable snapshots fall back to the
/// in-memory document.
async fn executed_snapshot(result: &ExecutionResult) -> Option<Document> {
    let path = result.executed_document.as_ref()?;
    let bytes = tokio::fs::read(path).await.ok()?;
    Document::from_bytes(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relab_document::Cell;

    fn doc() -> Document {
        assemble(vec![
            Cell::narrative("# Title"),
            Cell::executable("import numpy as np\n"),
            Cell::executable("x = np.zeros(3)\n"),
            Cell::executable("print(undefined)\n"),
        ])
    }

    #[test]
    fn repair_context_windows_around_attributed_cell() {
        let record = ErrorRecord {
            error_type: "NameError".to_string(),
            message: "name 'undefined' is not defined".to_string(),
            traceback: "Traceback ...".to_string(),
            cell_index: Some(3),
            cell_source: "print(undefined)\n".to_string(),
        };
        let context = repair_context(&doc(), &record);
        assert!(context.previous_cells.contains("[1] code:"));
        assert!(context.previous_cells.contains("[2] code:"));
        assert!(!context.previous_cells.contains("# Title"));
        assert!(context.following_cells.is_empty());
        assert!(context.error_text.starts_with("NameError:"));
    }

    #[test]
    fn parse_fix_accepts_fenced_and_rejects_empty() {
        let fix = parse_fix(
            "Patch below.\n```json\n{\"analysis\": \"x\", \"cells\": [{\"cell_index\": 3, \"source\": \"print(1)\"}]}\n```",
        )
        .unwrap();
        assert_eq!(fix.cells[0].cell_index, 3);

        assert!(parse_fix("{\"cells\": []}").is_err());
        assert!(parse_fix("no json here").is_err());
    }

    #[tokio::test]
    async fn unreadable_snapshot_is_ignored() {
        let mut result = ExecutionResult::failed(1, "boom");
        assert!(executed_snapshot(&result).await.is_none());

        result.executed_document = Some(std::path::PathBuf::from("/nonexistent/executed.ipynb"));
        assert!(executed_snapshot(&result).await.is_none());
    }
}
