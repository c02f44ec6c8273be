//! The `SandboxRuntime` capability trait

use crate::error::SandboxError;
use crate::result::{ExecutionRequest, ExecutionResult};

/// An isolated, resource-bounded execution environment
///
/// Implementations are ephemeral per call: a fresh environment is
/// provisioned, the document runs, the environment is torn down. No state
/// survives between calls except what the result captures. The environment
/// may be internally parallel; callers observe only the aggregate result.
#[async_trait::async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Execute a materialized document and return the normalized result
    ///
    /// A failing notebook is a successful call (`result.success == false`);
    /// the only error is an environment that could not be launched.
    ///
    /// # Errors
    /// `SandboxError::Unavailable` on provisioning/launch failure.
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, SandboxError>;
}
