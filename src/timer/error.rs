//! Timer engine error types.

use thiserror::Error;

/// Reasons a start request is refused.
///
/// These are refusals rather than failures: engine state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The engine is already preparing or cycling.
    #[error("timer is already running")]
    AlreadyRunning,

    /// Every phase of the draft is zero seconds long.
    #[error("nothing to run: every phase duration is zero")]
    NothingToRun,
}

impl TimerError {
    /// Returns true if the refusal comes from the configuration rather than
    /// the timer's current state.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NothingToRun)
    }
}
