//! RELAB Sandbox - isolated notebook execution
//!
//! The `SandboxRuntime` capability trait with one production implementation
//! (`DockerSandbox`, ephemeral container per attempt with CPU/memory/
//! wall-clock limits) and deterministic fakes in `relab-test-utils`.
//!
//! The adapter never mutates the caller's document: it receives bytes,
//! executes a materialized copy, and returns a fresh `ExecutionResult`.
//! Environment-launch failures surface as `SandboxError::Unavailable` and
//! are never retried here; patching code cannot repair infrastructure.

pub mod docker;
pub mod error;
pub mod result;
pub mod runtime;

pub use docker::DockerSandbox;
pub use error::SandboxError;
pub use result::{
    ExecutionRequest, ExecutionResult, ResourceLimits, TIMEOUT_EXIT_CODE, TIMEOUT_MARKER,
};
pub use runtime::SandboxRuntime;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
