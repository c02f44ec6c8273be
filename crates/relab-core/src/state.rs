//! Run lifecycle state machine
//!
//! The controller walks a run through a fixed set of states; every move is
//! checked against the transition table so an ordering bug surfaces as an
//! error instead of a silently inconsistent report.

use crate::error::StateError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of one reproduction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Run created, nothing generated yet
    Init,
    /// Initial document generated and assembled
    Generated,
    /// An execution attempt is in flight
    Executing,
    /// Last attempt ran clean; terminal
    Succeeded,
    /// Last attempt failed in a way a patch could address
    FailedRetryable,
    /// A repair proposal is being obtained and applied
    Fixing,
    /// Attempt ceiling reached without success; terminal
    Exhausted,
    /// Run ended for a non-retryable reason; terminal
    Failed,
}

impl RunState {
    /// True when no further transition is allowed
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: RunState) -> Vec<RunState> {
    use RunState::*;
    match from {
        Init => vec![Generated, Failed],
        Generated => vec![Executing],
        Executing => vec![Succeeded, FailedRetryable, Failed],
        FailedRetryable => vec![Fixing, Exhausted],
        Fixing => vec![Executing, Failed],
        Succeeded | Exhausted | Failed => vec![],
    }
}

/// Validate a single transition against the table
///
/// # Errors
/// `StateError::IllegalTransition` when the move is not in the table.
pub fn validate_transition(from: RunState, to: RunState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

/// Tracks the current state and enforces the table on every move
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: RunState,
}

impl StateTracker {
    /// New tracker in `Init`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RunState::Init,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn current(&self) -> RunState {
        self.current
    }

    /// Move to `to`, validating against the table
    ///
    /// # Errors
    /// `StateError::IllegalTransition` on a move not in the table.
    pub fn advance(&mut self, to: RunState) -> Result<(), StateError> {
        validate_transition(self.current, to)?;
        tracing::debug!(from = ?self.current, to = ?to, "run state transition");
        self.current = to;
        Ok(())
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RunState::*;

    #[test]
    fn happy_path_is_legal() {
        let mut tracker = StateTracker::new();
        for state in [Generated, Executing, Succeeded] {
            tracker.advance(state).unwrap();
        }
        assert!(tracker.current().is_terminal());
    }

    #[test]
    fn repair_loop_cycles_through_fixing() {
        let mut tracker = StateTracker::new();
        for state in [Generated, Executing, FailedRetryable, Fixing, Executing, Succeeded] {
            tracker.advance(state).unwrap();
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [Succeeded, Exhausted, Failed] {
            assert!(terminal.is_terminal());
            assert!(validate_transition(terminal, Executing).is_err());
        }
    }

    #[test]
    fn skipping_generation_is_illegal() {
        let err = validate_transition(Init, Executing).unwrap_err();
        assert!(matches!(
            err,
            StateError::IllegalTransition { from: Init, to: Executing }
        ));
    }
}
