//! Run trajectory: every language-model exchange, in order
//!
//! The trajectory is the audit record of a run: each model call appends one
//! entry, the pipeline's decomposition calls included. Execution attempts
//! are summarized in the run report's history instead. The trajectory is
//! persisted verbatim as `trajectory.json` next to the other run outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role string recorded for language-model entries
pub(crate) const LM_ROLE: &str = "language_model";

/// One recorded model exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    /// Position in the run, starting at 1
    pub seq: u64,
    /// Which collaborator ("language_model")
    pub role: String,
    /// What was asked of it ("generate_notebook", "fix_notebook", ...)
    pub action: String,
    /// Request payload (prompt text)
    pub request: String,
    /// Response payload (free text)
    pub response: String,
    /// One-line outcome ("ok", "rejected: ...", "error: ...")
    pub outcome: String,
    /// When the interaction completed
    pub timestamp: DateTime<Utc>,
}

/// Append-only sequence of model exchanges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trajectory {
    entries: Vec<TrajectoryEntry>,
}

impl Trajectory {
    /// Empty trajectory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one exchange
    pub fn record(
        &mut self,
        role: &str,
        action: &str,
        request: impl Into<String>,
        response: impl Into<String>,
        outcome: impl Into<String>,
    ) {
        self.entries.push(TrajectoryEntry {
            seq: self.entries.len() as u64 + 1,
            role: role.to_string(),
            action: action.to_string(),
            request: request.into(),
            response: response.into(),
            outcome: outcome.into(),
            timestamp: Utc::now(),
        });
    }

    /// Recorded entries, in order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[TrajectoryEntry] {
        &self.entries
    }

    /// Number of recorded entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize for persistence
    ///
    /// # Errors
    /// Serializer faults only.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
