//! Phase cues for the breathing timer.
//!
//! The engine only announces that a phase began; this module turns those
//! announcements into a tone and a haptic pulse, subject to the user's
//! preferences.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  TimerEvent   ┌───────────────┐  tone / haptic  ┌───────────┐
//! │ TimerEngine  │──────────────▶│ CueDispatcher │────────────────▶│ CuePlayer │
//! └──────────────┘   (mpsc)      └───────▲───────┘                 └───────────┘
//!                                        │ Preferences (watch)
//! ```
//!
//! Cue failures are logged and dropped; they never reach the timer.

mod dispatcher;
mod error;
mod terminal;

pub use dispatcher::CueDispatcher;
pub use error::CueError;
pub use terminal::TerminalCuePlayer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::types::Phase;

/// Trait for cue output implementations.
///
/// Methods should return promptly; the dispatcher calls them inline.
pub trait CuePlayer {
    /// Plays the tone for a phase that just began.
    ///
    /// # Errors
    ///
    /// Returns an error if the tone could not be played.
    fn tone(&self, phase: Phase) -> Result<(), CueError>;

    /// Fires a haptic pulse.
    ///
    /// # Errors
    ///
    /// Returns an error if the pulse could not be delivered.
    fn haptic(&self) -> Result<(), CueError>;

    /// Cuts off any tone still playing. Called when the timer stops.
    fn silence(&self) {}
}

/// A cue recorded by [`MockCuePlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueCall {
    Tone(Phase),
    Haptic,
    Silence,
}

/// Mock cue player for testing.
#[derive(Debug, Default)]
pub struct MockCuePlayer {
    calls: Mutex<Vec<CueCall>>,
    should_fail: AtomicBool,
}

impl MockCuePlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<CueCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn tone_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CueCall::Tone(_)))
            .count()
    }

    #[must_use]
    pub fn haptic_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, CueCall::Haptic))
            .count()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: CueCall) -> Result<(), CueError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(CueError::Playback("mock failure".to_string()));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(())
    }
}

impl CuePlayer for MockCuePlayer {
    fn tone(&self, phase: Phase) -> Result<(), CueError> {
        self.record(CueCall::Tone(phase))
    }

    fn haptic(&self) -> Result<(), CueError> {
        self.record(CueCall::Haptic)
    }

    fn silence(&self) {
        let _ = self.record(CueCall::Silence);
    }
}

impl<P: CuePlayer + ?Sized> CuePlayer for std::sync::Arc<P> {
    fn tone(&self, phase: Phase) -> Result<(), CueError> {
        (**self).tone(phase)
    }

    fn haptic(&self) -> Result<(), CueError> {
        (**self).haptic()
    }

    fn silence(&self) {
        (**self).silence()
    }
}
