//! Error types for sandbox execution

/// Errors from the sandbox adapter
///
/// Execution failures of the notebook itself are NOT errors here; they come
/// back as an `ExecutionResult` with `success == false`. The only error this
/// adapter raises is the non-fixable kind: the environment could not be
/// provisioned or launched at all.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The execution environment could not be provisioned or launched
    #[error("sandbox unavailable: {reason}")]
    Unavailable {
        /// What went wrong (image missing, runtime not installed, staging
        /// I/O failure, resource exhaustion)
        reason: String,
    },
}

impl SandboxError {
    /// Shorthand constructor
    #[inline]
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
