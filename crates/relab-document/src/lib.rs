//! RELAB Document - the runnable artifact
//!
//! An ordered sequence of narrative and executable cells plus format-version
//! metadata. The on-disk shape is nbformat v4 JSON, so any standard notebook
//! tool can open what this crate writes; the in-memory model is ours.
//!
//! Invariants this crate owns:
//! - `Document::from_bytes(d.to_bytes()) == d` (order, kind, source exact)
//! - patch application is all-or-nothing and touches only targeted indices

pub mod cell;
pub mod document;
pub mod error;
pub mod fix;

pub use cell::{Cell, CellKind, SourceText};
pub use document::{assemble, Document, NBFORMAT, NBFORMAT_MINOR};
pub use error::DocumentError;
pub use fix::{CellFix, FixRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
