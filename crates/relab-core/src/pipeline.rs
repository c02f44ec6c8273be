//! End-to-end pipeline: paper chunks in, run report out
//!
//! Wraps decomposition, experiment selection, and the iteration controller.
//! The merged decomposition is persisted as `decomposition.json` before any
//! execution, so a failed run still leaves the extracted structure behind.
//! Decomposition model exchanges are recorded and seed the run trajectory.

use crate::config::RunConfig;
use crate::controller::IterationController;
use crate::error::PipelineError;
use crate::report::RunReport;
use crate::trajectory::{Trajectory, LM_ROLE};
use relab_decompose::DecompositionExtractor;
use relab_llm::{LanguageModel, LmError, LmRequest};
use relab_sandbox::SandboxRuntime;
use std::sync::{Arc, Mutex};

/// Persisted merged decomposition
pub const DECOMPOSITION_FILE: &str = "decomposition.json";

/// Decompose a paper, pick an experiment, and drive it to a terminal report
pub struct ReproPipeline {
    lm: Arc<dyn LanguageModel>,
    sandbox: Arc<dyn SandboxRuntime>,
    config: RunConfig,
}

impl ReproPipeline {
    /// Create a pipeline over the given collaborators
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

    /// Run the full pipeline for one experiment of the paper
    ///
    /// `chunks` are ordered paper-text chunks; `experiment_index` selects
    /// which extracted experiment to reproduce.
    ///
    /// # Errors
    /// - `PipelineError::Decompose` when decomposition fails
    /// - `PipelineError::NoExperiments` / `ExperimentOutOfRange` on selection
    /// - `PipelineError::Controller` on controller persistence faults
    pub async fn run(
        &self,
        chunks: &[String],
        experiment_index: usize,
    ) -> Result<RunReport, PipelineError> {
        let recorder = Arc::new(RecordingModel::new(self.lm.clone()));
        let extractor = DecompositionExtractor::new(recorder.clone());
        let decomposition = extractor.extract(chunks).await?;

        let mut trajectory = Trajectory::new();
        recorder.drain_into(&mut trajectory);

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let mut bytes = serde_json::to_vec_pretty(&decomposition)?;
        bytes.push(b'\n');
        tokio::fs::write(self.config.output_dir.join(DECOMPOSITION_FILE), bytes).await?;

        if decomposition.experiments.is_empty() {
            return Err(PipelineError::NoExperiments);
        }
        let experiment = decomposition.experiments.get(experiment_index).ok_or(
            PipelineError::ExperimentOutOfRange {
                index: experiment_index,
                len: decomposition.experiments.len(),
            },
        )?;
        tracing::info!(
            experiment = %experiment.id,
            of = decomposition.experiments.len(),
            "experiment selected"
        );

        let controller = IterationController::new(
            self.lm.clone(),
            self.sandbox.clone(),
            self.config.clone(),
        );
        Ok(controller.run_with_trajectory(experiment, trajectory).await?)
    }
}

struct RecordedExchange {
    action: &'static str,
    request: String,
    response: String,
    outcome: String,
}

/// Delegating model handle that logs each exchange for the trajectory
struct RecordingModel {
    inner: Arc<dyn LanguageModel>,
    exchanges: Mutex<Vec<RecordedExchange>>,
}

impl RecordingModel {
    fn new(inner: Arc<dyn LanguageModel>) -> Self {
        Self {
            inner,
            exchanges: Mutex::new(Vec::new()),
        }
    }

    fn drain_into(&self, trajectory: &mut Trajectory) {
        let mut exchanges = self
            .exchanges
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for exchange in exchanges.drain(..) {
            trajectory.record(
                LM_ROLE,
                exchange.action,
                exchange.request,
                exchange.response,
                exchange.outcome,
            );
        }
    }

    fn push(&self, exchange: RecordedExchange) {
        self.exchanges
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(exchange);
    }
}

#[async_trait::async_trait]
impl LanguageModel for RecordingModel {
    async fn complete(&self, request: LmRequest) -> Result<String, LmError> {
        let action = request.kind.name();
        let prompt = request.prompt.clone();
        match self.inner.complete(request).await {
            Ok(response) => {
                self.push(RecordedExchange {
                    action,
                    request: prompt,
                    response: response.clone(),
                    outcome: "ok".to_string(),
                });
                Ok(response)
            }
            Err(e) => {
                self.push(RecordedExchange {
                    action,
                    request: prompt,
                    response: String::new(),
                    outcome: format!("error: {e}"),
                });
                Err(e)
            }
        }
    }
}
