//! Timer module for the breathing timer.
//!
//! This module contains the phase scheduling functionality:
//! - `engine`: Deadline-anchored state machine with live draft edits
//! - `driver`: Tokio task that ticks a shared engine
//! - `sequencer`: Phase ordering and zero-phase skipping
//! - `error`: Start refusals

pub mod driver;
pub mod engine;
pub mod error;
pub mod sequencer;

pub use driver::{run_ticker, SharedEngine, Ticker};
pub use engine::{phase_progress, TimerEngine, TimerEvent, TimerSnapshot, TimerStatus};
pub use error::TimerError;
pub use sequencer::{first_non_zero_phase, next_phase_in_cycle};
