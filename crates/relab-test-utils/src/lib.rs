//! Testing utilities for the RELAB workspace
//!
//! Scripted collaborator fakes and shared fixtures.

#![allow(missing_docs)]

use relab_decompose::{
    Assessment, DatasetDescriptor, ExperimentDescription, HyperValue, ModelDescriptor,
    PaperDecomposition, Section,
};
use relab_document::Cell;
use relab_llm::{LanguageModel, LmError, LmRequest};
use relab_sandbox::{ExecutionRequest, ExecutionResult, SandboxError, SandboxRuntime};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A `LanguageModel` that replays queued outcomes in order
///
/// Every request is recorded; when the queue runs dry the fake returns
/// `LmError::Exhausted`, which makes over-consumption visible in tests.
#[derive(Debug, Default)]
pub struct ScriptedLanguageModel {
    outcomes: Mutex<VecDeque<Result<String, LmError>>>,
    requests: Mutex<Vec<LmRequest>>,
}

impl ScriptedLanguageModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fake = Self::new();
        for response in responses {
            fake.push_response(response);
        }
        fake
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
    }

    pub fn push_error(&self, error: LmError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// All requests seen so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<LmRequest> {
        self.requests.lock().unwrap().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn complete(&self, request: LmRequest) -> Result<String, LmError> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LmError::Exhausted))
    }
}

/// A `SandboxRuntime` that replays queued outcomes in order
///
/// When the queue runs dry it reports the environment as unavailable.
#[derive(Debug, Default)]
pub struct ScriptedSandbox {
    outcomes: Mutex<VecDeque<Result<ExecutionResult, SandboxError>>>,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl ScriptedSandbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, outcome: Result<ExecutionResult, SandboxError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn push_success(&self) {
        self.push_outcome(Ok(ExecutionResult::succeeded()));
    }

    pub fn push_failure(&self, exit_code: i32, stderr: impl Into<String>) {
        self.push_outcome(Ok(ExecutionResult::failed(exit_code, stderr)));
    }

    pub fn push_timeout(&self, limit: std::time::Duration) {
        self.push_outcome(Ok(ExecutionResult::timed_out(limit)));
    }

    pub fn push_unavailable(&self, reason: impl Into<String>) {
        self.push_outcome(Err(SandboxError::unavailable(reason)));
    }

    /// All execution requests seen so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().unwrap().clone()
    }

    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SandboxRuntime for ScriptedSandbox {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, SandboxError> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SandboxError::unavailable("no scripted outcome queued")))
    }
}

/// A small but fully populated experiment description
#[must_use]
pub fn sample_experiment() -> ExperimentDescription {
    let mut hyperparameters = indexmap::IndexMap::new();
    hyperparameters.insert("learning_rate".to_string(), HyperValue::Float(0.01));
    hyperparameters.insert("epochs".to_string(), HyperValue::Int(5));
    hyperparameters.insert("optimizer".to_string(), HyperValue::Text("adam".to_string()));

    ExperimentDescription {
        id: "exp-1".to_string(),
        title: "MLP baseline on MNIST".to_string(),
        description: "Train a two-layer MLP and report test accuracy.".to_string(),
        dataset: DatasetDescriptor {
            name: "MNIST".to_string(),
            source: "torchvision".to_string(),
            size: "70k images".to_string(),
            synthetic: false,
        },
        input_shape: "(N, 784)".to_string(),
        output_shape: "(N, 10)".to_string(),
        model: ModelDescriptor {
            kind: "mlp".to_string(),
            architecture: "784-256-10".to_string(),
            framework: "pytorch".to_string(),
        },
        hyperparameters,
        metrics: vec!["accuracy".to_string()],
        figures: vec!["Figure 2".to_string()],
    }
}

/// A merged decomposition wrapping `sample_experiment`
#[must_use]
pub fn sample_decomposition() -> PaperDecomposition {
    PaperDecomposition {
        title: "A Simple Baseline".to_string(),
        authors: vec!["A. Author".to_string(), "B. Author".to_string()],
        abstract_text: "We show a simple baseline is strong.".to_string(),
        sections: vec![Section {
            id: "4".to_string(),
            heading: "Experiments".to_string(),
            summary: "Baseline experiments on MNIST.".to_string(),
        }],
        experiments: vec![sample_experiment()],
        reproducibility: Assessment::default(),
    }
}

/// A minimal runnable cell sequence: title, imports, workload
#[must_use]
pub fn sample_cells() -> Vec<Cell> {
    vec![
        Cell::narrative("# MLP baseline on MNIST\n\nGenerated reproduction."),
        Cell::executable("import numpy as np\nrng = np.random.default_rng(0)\n"),
        Cell::executable("x = rng.normal(size=(32, 784))\nprint(x.mean())\n"),
    ]
}

/// A generation response payload in the shape the cell generator expects
#[must_use]
pub fn generation_response(cells: &[(&str, &str)]) -> String {
    let cells: Vec<_> = cells
        .iter()
        .map(|(kind, source)| serde_json::json!({"cell_type": kind, "source": source}))
        .collect();
    serde_json::json!({ "cells": cells }).to_string()
}

/// A repair response payload targeting one cell
#[must_use]
pub fn fix_response(cell_index: usize, source: &str) -> String {
    serde_json::json!({
        "analysis": "replace the failing cell",
        "cells": [{"cell_index": cell_index, "source": source}]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relab_llm::PromptKind;

    #[tokio::test]
    async fn scripted_model_replays_in_order_then_exhausts() {
        let lm = ScriptedLanguageModel::with_responses(["first", "second"]);
        let req = LmRequest::new(PromptKind::Decompose, "p");

        assert_eq!(lm.complete(req.clone()).await.unwrap(), "first");
        assert_eq!(lm.complete(req.clone()).await.unwrap(), "second");
        assert!(matches!(
            lm.complete(req).await.unwrap_err(),
            LmError::Exhausted
        ));
        assert_eq!(lm.request_count(), 3);
    }

    #[tokio::test]
    async fn scripted_sandbox_records_requests() {
        let sandbox = ScriptedSandbox::new();
        sandbox.push_failure(1, "NameError: boom");
        sandbox.push_success();

        let request = ExecutionRequest {
            document: b"{}".to_vec(),
            image: "python:3.11-slim".to_string(),
            limits: Default::default(),
            timeout: std::time::Duration::from_secs(1),
            output_dir: "/tmp/out".into(),
            executed_path: "/tmp/out/executed.ipynb".into(),
        };

        let first = sandbox.execute(request.clone()).await.unwrap();
        assert!(!first.success);
        let second = sandbox.execute(request).await.unwrap();
        assert!(second.success);
        assert_eq!(sandbox.execution_count(), 2);
    }

    #[test]
    fn generation_response_is_parseable() {
        let payload = generation_response(&[("markdown", "# hi"), ("code", "x = 1")]);
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["cells"][1]["cell_type"], "code");
    }
}
