//! Breathe Timer Library
//!
//! This library provides the core functionality for the breathing timer CLI.
//! It includes:
//! - Duration model and phase types
//! - Deadline-anchored timer engine with a tokio tick driver
//! - Preset catalog with favorites and hidden built-ins
//! - Key-value persistence for presets and preferences
//! - Phase cue dispatch (tones and haptics)
//! - CLI command parsing and display utilities

pub mod cli;
pub mod controller;
pub mod cues;
pub mod format;
pub mod presets;
pub mod storage;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use controller::BreathingController;
pub use format::{format_minutes_seconds, remaining_seconds_display};
pub use types::{
    clamp_seconds, durations_equal, same_config, DurationSet, Phase, Preferences, TimerSettings,
};

// Re-export timer types
pub use timer::{
    first_non_zero_phase, next_phase_in_cycle, Ticker, TimerEngine, TimerError, TimerEvent,
    TimerSnapshot, TimerStatus,
};

// Re-export preset types
pub use presets::{AddedPreset, CatalogEntry, Preset, PresetCatalog, Removal};

// Re-export storage types
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

// Re-export cue types
pub use cues::{CueDispatcher, CueError, CuePlayer, MockCuePlayer, TerminalCuePlayer};
