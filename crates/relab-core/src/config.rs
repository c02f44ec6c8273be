//! Run configuration

use relab_sandbox::ResourceLimits;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default ceiling on execution attempts per run
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Default wall-clock limit per execution attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default execution-environment image
pub const DEFAULT_IMAGE: &str = "python:3.11-slim";

/// Whether generated documents work against synthetic or real data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// Generate data in-document; never download real datasets
    #[default]
    Synthetic,
    /// Use the datasets the paper names
    Real,
}

impl DataMode {
    /// True in synthetic-data mode
    #[inline]
    #[must_use]
    pub fn is_synthetic(self) -> bool {
        matches!(self, DataMode::Synthetic)
    }
}

/// Configuration for one reproduction run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Data mode passed through to generation prompts
    pub data_mode: DataMode,
    /// Execution-environment image
    pub image: String,
    /// Wall-clock limit per execution attempt
    pub timeout: Duration,
    /// Ceiling on execution attempts (generation is not an attempt)
    pub max_iterations: u32,
    /// CPU/memory limits for the sandbox
    pub limits: ResourceLimits,
    /// Directory where all run outputs are written
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// Defaults with the given output directory
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_mode: DataMode::default(),
            image: DEFAULT_IMAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            limits: ResourceLimits::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Set the data mode
    #[inline]
    #[must_use]
    pub fn with_data_mode(mut self, mode: DataMode) -> Self {
        self.data_mode = mode;
        self
    }

    /// Set the execution-environment image
    #[inline]
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the per-attempt wall-clock limit
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the execution-attempt ceiling (clamped to at least 1)
    #[inline]
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the sandbox resource limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfig::new("/tmp/run");
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.data_mode.is_synthetic());
        assert_eq!(config.image, "python:3.11-slim");
    }

    #[test]
    fn builders_override_and_clamp() {
        let config = RunConfig::new("/tmp/run")
            .with_data_mode(DataMode::Real)
            .with_max_iterations(0)
            .with_image("custom:latest");
        assert_eq!(config.data_mode, DataMode::Real);
        assert_eq!(config.max_iterations, 1);
        assert_eq!(config.image, "custom:latest");
    }
}
