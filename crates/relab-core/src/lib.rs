//! RELAB Core - run orchestration
//!
//! The iteration controller and everything around it:
//! - run configuration (data mode, image, limits, attempt ceiling)
//! - initial document generation from an experiment description
//! - structured error extraction from failed attempts
//! - the run lifecycle state machine
//! - trajectory and report records, persisted with the run outputs
//! - the end-to-end pipeline from paper chunks to a terminal report
//!
//! Collaborators (language model, sandbox) are trait objects; production
//! wiring and deterministic test wiring differ only in what gets injected.

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod generate;
pub mod pipeline;
pub mod report;
pub mod state;
pub mod trajectory;

pub use config::{DataMode, RunConfig, DEFAULT_MAX_ITERATIONS};
pub use controller::IterationController;
pub use error::{ControllerError, GenerationError, PipelineError, StateError};
pub use extract::{extract_error, ErrorRecord};
pub use generate::parse_cells;
pub use pipeline::ReproPipeline;
pub use report::{AttemptSummary, RunReport, TerminalCondition};
pub use state::{allowed_transitions, validate_transition, RunState, StateTracker};
pub use trajectory::{Trajectory, TrajectoryEntry};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
