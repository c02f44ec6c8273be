//! Error types for the run controller and pipeline

use crate::state::RunState;
use relab_decompose::DecomposeError;
use relab_document::DocumentError;
use relab_llm::{LmError, ResponseError};

/// Errors producing the initial cell sequence from a collaborator response
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Collaborator transport failure
    #[error(transparent)]
    Lm(#[from] LmError),

    /// No JSON payload could be located in the response
    #[error("no cell payload in response: {0}")]
    Response(#[from] ResponseError),

    /// A payload was located but does not match the cell shape
    #[error("malformed cell payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload parsed but contains no cells
    #[error("generated document has no cells")]
    EmptyCells,

    /// The payload parsed but contains nothing runnable
    #[error("generated document has no executable cells")]
    NoExecutableCells,
}

/// Illegal run-state transitions
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The requested move is not in the transition table
    #[error("illegal run state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: RunState, to: RunState },
}

/// Faults of the controller itself, distinct from run outcomes
///
/// A failed run (exhausted, unfixable, sandbox down) is a `RunReport`, not an
/// error; these cover only the controller's own persistence and invariants.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Writing a run output failed
    #[error("run output I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Document serialization fault
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Report or trajectory serialization fault
    #[error("run record serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The controller attempted an illegal lifecycle move
    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors from the end-to-end pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Decomposition failed
    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    /// The decomposition contains no experiments to reproduce
    #[error("decomposition contains no experiments")]
    NoExperiments,

    /// The requested experiment index does not exist
    #[error("experiment index {index} out of range (decomposition has {len})")]
    ExperimentOutOfRange { index: usize, len: usize },

    /// Controller fault
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Writing the decomposition record failed
    #[error("pipeline output I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Decomposition record serialization fault
    #[error("decomposition serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
}
