//! Cue playback error types.

use std::io;
use thiserror::Error;

/// Errors that can occur while playing a phase cue.
///
/// Cue failures never affect the timer; the dispatcher logs and drops them.
#[derive(Debug, Error)]
pub enum CueError {
    /// Writing to the cue output failed.
    #[error("failed to write cue: {0}")]
    Output(#[source] io::Error),

    /// The cue device is not available.
    #[error("cue device unavailable: {0}")]
    DeviceNotAvailable(String),

    /// Generic playback error.
    #[error("cue playback error: {0}")]
    Playback(String),
}

impl CueError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::Output(_))
    }
}
