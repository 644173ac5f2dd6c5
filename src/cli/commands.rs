//! Command definitions for the breathing timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{DurationSet, Phase};

/// Longest inhale or exhale accepted on the command line, in seconds.
pub const MAX_BREATH_SECONDS: u32 = 20;

/// Longest hold accepted on the command line, in seconds.
pub const MAX_HOLD_SECONDS: u32 = 300;

// ============================================================================
// CLI Structure
// ============================================================================

/// Breathe - a guided breathing timer for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "breathe",
    version,
    about = "Guided breathing timer with presets and phase cues",
    long_about = "Walks you through a repeating inhale / hold / exhale / hold cycle.\n\
                  Presets, favorites and cue preferences are saved between runs.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings store file (default: ~/.breathe/store.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a guided breathing session
    Run(RunArgs),

    /// Manage presets
    Presets {
        #[command(subcommand)]
        command: PresetCommands,
    },

    /// Show or change cue preferences
    Prefs(PrefsArgs),

    /// Delete custom presets, favorites and hidden built-ins
    ResetData,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Preset subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PresetCommands {
    /// List visible presets
    List {
        /// Only show favorites
        #[arg(short, long)]
        favorites: bool,
    },

    /// Save a custom preset
    Add(AddPresetArgs),

    /// Delete a custom preset or hide a built-in
    Remove {
        /// Preset name
        name: String,
    },

    /// Toggle a preset's favorite flag
    ///
    /// Without a name, toggles whichever preset matches the current
    /// configuration, saving it as a new favorite if none does.
    Favorite {
        /// Preset name
        name: Option<String>,

        /// Label for a newly saved preset
        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// Make a preset the starting configuration
    Apply {
        /// Preset name
        name: String,
    },
}

// ============================================================================
// Phase Duration Arguments
// ============================================================================

/// Per-phase overrides shared by `run` and `presets add`
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationArgs {
    /// Inhale seconds (0-20)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_BREATH_SECONDS as i64))]
    pub inhale: Option<u32>,

    /// Hold after inhale, seconds (0-300)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_HOLD_SECONDS as i64))]
    pub hold1: Option<u32>,

    /// Exhale seconds (0-20)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_BREATH_SECONDS as i64))]
    pub exhale: Option<u32>,

    /// Hold after exhale, seconds (0-300)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_HOLD_SECONDS as i64))]
    pub hold2: Option<u32>,

    /// Session length in minutes, 0 for unlimited
    #[arg(short, long)]
    pub minutes: Option<u32>,
}

impl DurationArgs {
    /// Phase overrides that were given, in cycle order.
    pub fn overrides(&self) -> Vec<(Phase, u32)> {
        [
            (Phase::Inhale, self.inhale),
            (Phase::Hold1, self.hold1),
            (Phase::Exhale, self.exhale),
            (Phase::Hold2, self.hold2),
        ]
        .into_iter()
        .filter_map(|(phase, seconds)| seconds.map(|s| (phase, s)))
        .collect()
    }

    /// Applies the overrides on top of `base`.
    pub fn apply_to(&self, base: DurationSet) -> DurationSet {
        self.overrides()
            .into_iter()
            .fold(base, |set, (phase, seconds)| set.with(phase, seconds))
    }
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Start from this preset
    #[arg(short, long)]
    pub preset: Option<String>,

    #[command(flatten)]
    pub durations: DurationArgs,

    /// Countdown before the first phase, in seconds (0-60)
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u64).range(0..=60))]
    pub prepare: u64,

    /// Disable phase tones for this session
    #[arg(long)]
    pub no_sound: bool,
}

// ============================================================================
// Preset Add Arguments
// ============================================================================

/// Arguments for the presets add command
#[derive(Args, Debug, Clone)]
pub struct AddPresetArgs {
    /// Display label
    pub label: String,

    #[command(flatten)]
    pub durations: DurationArgs,

    /// Also mark the preset favorite
    #[arg(short, long)]
    pub favorite: bool,
}

// ============================================================================
// Prefs Arguments
// ============================================================================

/// On/off switch value
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

/// Arguments for the prefs command
#[derive(Args, Debug, Clone, Default)]
pub struct PrefsArgs {
    /// Phase tones
    #[arg(long, value_enum)]
    pub sound: Option<Switch>,

    /// Haptic pulses
    #[arg(long, value_enum)]
    pub vibration: Option<Switch>,
}

impl PrefsArgs {
    /// True if any preference is being changed.
    pub fn has_changes(&self) -> bool {
        self.sound.is_some() || self.vibration.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
