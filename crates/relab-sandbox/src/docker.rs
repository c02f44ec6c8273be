//! Docker-backed sandbox
//!
//! One ephemeral container per execution attempt. The document is staged in
//! a fresh temp directory mounted at `/workspace`, executed via `jupyter
//! nbconvert --execute`, and the container is torn down afterwards. The
//! wall-clock limit is enforced from the host; on expiry the container is
//! force-killed and the attempt comes back as a timeout result.

use crate::error::SandboxError;
use crate::result::{ExecutionRequest, ExecutionResult};
use crate::runtime::SandboxRuntime;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const NOTEBOOK_NAME: &str = "notebook.ipynb";
const EXECUTED_NAME: &str = "executed.ipynb";

/// Exit code `docker run` itself uses for daemon/image failures
const DOCKER_RUN_FAILURE: i32 = 125;

/// Production sandbox backed by the local Docker daemon
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    docker_bin: String,
}

impl DockerSandbox {
    /// Create a sandbox using `docker` from `PATH`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            docker_bin: "docker".to_string(),
        }
    }

    /// Override the docker binary (e.g. `podman`)
    #[inline]
    #[must_use]
    pub fn with_docker_bin(mut self, bin: impl Into<String>) -> Self {
        self.docker_bin = bin.into();
        self
    }

    /// Best-effort forcible termination of a timed-out container
    async fn force_kill(&self, name: &str) {
        let _ = tokio::process::Command::new(&self.docker_bin)
            .args(["kill", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;
    }
}

impl Default for DockerSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SandboxRuntime for DockerSandbox {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, SandboxError> {
        let start = Instant::now();

        let stage = tempfile::tempdir()
            .map_err(|e| SandboxError::unavailable(format!("staging directory: {e}")))?;
        tokio::fs::write(stage.path().join(NOTEBOOK_NAME), &request.document)
            .await
            .map_err(|e| SandboxError::unavailable(format!("staging document: {e}")))?;

        let name = container_name();
        let args = docker_args(&request, stage.path(), &name);
        tracing::debug!(image = %request.image, container = %name, "launching sandbox");

        let child = tokio::process::Command::new(&self.docker_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SandboxError::unavailable(format!("failed to launch {}: {e}", self.docker_bin))
            })?;

        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(SandboxError::unavailable(format!("container wait: {e}")));
            }
            Err(_elapsed) => {
                tracing::warn!(container = %name, timeout_secs = request.timeout.as_secs(), "sandbox timed out");
                self.force_kill(&name).await;
                let mut result = ExecutionResult::timed_out(request.timeout);
                result.execution_time = start.elapsed();
                result.artifacts =
                    collect_artifacts(stage.path(), &request.output_dir).await;
                return Ok(result);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        // docker run failed before the notebook ever ran (image missing,
        // daemon down): infrastructure, not a fixable execution failure
        if exit_code == DOCKER_RUN_FAILURE {
            return Err(SandboxError::unavailable(format!(
                "docker run failed: {}",
                stderr.trim()
            )));
        }

        let mut executed_document = None;
        let mut cell_error = false;
        if let Ok(bytes) = tokio::fs::read(stage.path().join(EXECUTED_NAME)).await {
            cell_error = has_error_output(&bytes);
            if let Some(parent) = request.executed_path.parent() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
            match tokio::fs::write(&request.executed_path, &bytes).await {
                Ok(()) => executed_document = Some(request.executed_path.clone()),
                Err(e) => tracing::warn!(error = %e, "could not persist executed snapshot"),
            }
        }

        let artifacts = collect_artifacts(stage.path(), &request.output_dir).await;
        let success = exit_code == 0 && !cell_error;

        tracing::info!(
            exit_code,
            success,
            artifacts = artifacts.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "sandbox execution finished"
        );

        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_code,
            execution_time: start.elapsed(),
            artifacts,
            executed_document,
            success,
        })
    }
}

/// In-container command: install execution tooling, then run the notebook
fn container_script(timeout_secs: u64) -> String {
    format!(
        "pip install -q nbformat nbclient nbconvert ipykernel >/dev/null 2>&1; \
         jupyter nbconvert --to notebook --execute \
         --output {EXECUTED_NAME} \
         --ExecutePreprocessor.timeout={timeout_secs} \
         {NOTEBOOK_NAME}"
    )
}

/// Arguments to `docker` for one execution
fn docker_args(request: &ExecutionRequest, stage: &Path, name: &str) -> Vec<String> {
    vec![
        "run".to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--cpus".to_string(),
        format!("{}", request.limits.cpu_cores),
        "--memory".to_string(),
        format!("{}m", request.limits.memory_mb),
        "-v".to_string(),
        format!("{}:/workspace", stage.display()),
        "-w".to_string(),
        "/workspace".to_string(),
        request.image.clone(),
        "sh".to_string(),
        "-c".to_string(),
        container_script(request.timeout.as_secs()),
    ]
}

/// Unique-enough container name for forcible kills
fn container_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("relab-{nanos}")
}

/// True when an executed document records a cell-level exception
fn has_error_output(bytes: &[u8]) -> bool {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) else {
        return false;
    };
    let Some(cells) = value.get("cells").and_then(|c| c.as_array()) else {
        return false;
    };
    cells.iter().any(|cell| {
        cell.get("outputs")
            .and_then(|o| o.as_array())
            .is_some_and(|outputs| {
                outputs
                    .iter()
                    .any(|out| out.get("output_type").and_then(|t| t.as_str()) == Some("error"))
            })
    })
}

/// Copy files the notebook wrote in its workspace into `output_dir`
///
/// Best-effort: an unreadable entry is logged and skipped, never fatal.
async fn collect_artifacts(stage: &Path, output_dir: &Path) -> Vec<PathBuf> {
    let mut collected = Vec::new();

    let mut entries = match tokio::fs::read_dir(stage).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "could not scan workspace for artifacts");
            return collected;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name == NOTEBOOK_NAME || name == EXECUTED_NAME || name.starts_with('.') {
            continue;
        }
        if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            tracing::warn!(error = %e, "could not create artifact directory");
            return collected;
        }
        let dest = output_dir.join(file_name.as_os_str());
        match tokio::fs::copy(entry.path(), &dest).await {
            Ok(_) => collected.push(dest),
            Err(e) => tracing::warn!(artifact = %name, error = %e, "could not collect artifact"),
        }
    }

    collected.sort();
    collected
}
