//! CLI module for the breathing timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `session`: Foreground loop that renders a running session

pub mod commands;
pub mod display;
pub mod session;

pub use commands::{
    AddPresetArgs, Cli, Commands, DurationArgs, PresetCommands, PrefsArgs, RunArgs, Switch,
};
pub use display::{Display, SessionEnd};
pub use session::run_session;
