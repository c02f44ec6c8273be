//! Execution request/result model

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Exit code reported when the wall-clock limit forcibly ends an execution
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Marker appended to stderr when an execution times out
pub const TIMEOUT_MARKER: &str = "execution timed out";

/// CPU and memory limits enforced on the environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU cores (fractional allowed)
    pub cpu_cores: f64,
    /// Memory in megabytes
    pub memory_mb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_cores: 1.0,
            memory_mb: 2048,
        }
    }
}

/// One execution request: document bytes plus environment configuration
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Serialized document to execute
    pub document: Vec<u8>,
    /// Execution-environment image identifier
    pub image: String,
    /// CPU/memory limits
    pub limits: ResourceLimits,
    /// Wall-clock limit for the whole execution
    pub timeout: Duration,
    /// Host directory where collected artifacts are placed
    pub output_dir: PathBuf,
    /// Host path where the executed document snapshot is written
    pub executed_path: PathBuf,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

/// Normalized outcome of one execution attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Process exit code (`TIMEOUT_EXIT_CODE` on timeout)
    pub exit_code: i32,
    /// Wall-clock time of the attempt
    #[serde(with = "duration_secs", rename = "execution_time_secs")]
    pub execution_time: Duration,
    /// Files collected from the designated output directory
    pub artifacts: Vec<PathBuf>,
    /// Executed document snapshot, when one was produced
    pub executed_document: Option<PathBuf>,
    /// Exit code 0 AND no cell-level exception recorded
    pub success: bool,
}

impl ExecutionResult {
    /// A clean, empty success (useful as a scripted baseline)
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            execution_time: Duration::ZERO,
            artifacts: Vec::new(),
            executed_document: None,
            success: true,
        }
    }

    /// A failure with the given exit code and stderr
    #[must_use]
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
            execution_time: Duration::ZERO,
            artifacts: Vec::new(),
            executed_document: None,
            success: false,
        }
    }

    /// A forcibly terminated attempt, stderr annotated with the marker
    #[must_use]
    pub fn timed_out(limit: Duration) -> Self {
        Self::failed(
            TIMEOUT_EXIT_CODE,
            format!("[timeout] {TIMEOUT_MARKER} after {}s", limit.as_secs()),
        )
    }

    /// True when the attempt was ended by the wall-clock limit
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE
    }
}
