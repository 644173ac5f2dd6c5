//! Display utilities for the breathing timer CLI.
//!
//! This module provides formatted output for:
//! - The live session status line
//! - Preset listings and preset changes
//! - Preferences
//! - Error messages

use crate::presets::{AddedPreset, CatalogEntry, Preset, Removal};
use crate::timer::{TimerSnapshot, TimerStatus};
use crate::types::Preferences;

/// Width of the phase progress bar in characters.
const BAR_WIDTH: usize = 20;

// ============================================================================
// SessionEnd
// ============================================================================

/// How a CLI session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The session deadline was reached
    Completed,
    /// Every phase became zero
    Stopped,
    /// The user pressed Ctrl-C
    Interrupted,
}

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Shows the configuration a session is about to run.
    pub fn show_session_start(snapshot: &TimerSnapshot, preset: Option<&str>) {
        println!("* Starting breathing session");
        if let Some(preset) = preset {
            println!("  Preset:  {}", preset);
        }
        println!("  Pattern: {}", snapshot.draft.pattern());
        println!("  Length:  {}", Self::session_length(snapshot.repeat_minutes));
        println!("  Press Ctrl-C to stop");
    }

    /// One-line live status for a snapshot.
    pub fn status_line(snapshot: &TimerSnapshot) -> String {
        match snapshot.status() {
            TimerStatus::Preparing => {
                format!("Get ready... {}", snapshot.pre_start_remaining_sec.unwrap_or(0))
            }
            TimerStatus::Cycling | TimerStatus::Idle => {
                let session = snapshot
                    .session_display()
                    .unwrap_or_else(|| "unlimited".to_string());
                format!(
                    "{:<6} {:>3}s [{}] {}",
                    snapshot.phase.label(),
                    snapshot.remaining_seconds_display,
                    Self::progress_bar(snapshot.progress),
                    session
                )
            }
        }
    }

    /// Renders `progress` in `[0, 1]` as a fixed-width bar.
    pub fn progress_bar(progress: f64) -> String {
        let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
        format!("{}{}", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled))
    }

    /// Shows how the session ended.
    pub fn show_session_end(end: SessionEnd) {
        match end {
            SessionEnd::Completed => println!("* Session complete"),
            SessionEnd::Stopped => println!("[] Stopped: every phase is zero seconds"),
            SessionEnd::Interrupted => println!("[] Session stopped"),
        }
    }

    fn session_length(repeat_minutes: u32) -> String {
        match repeat_minutes {
            0 => "unlimited".to_string(),
            1 => "1 minute".to_string(),
            n => format!("{} minutes", n),
        }
    }

    // ------------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------------

    /// Formats one catalog row. `selected` marks the preset matching the
    /// current configuration.
    pub fn preset_row(entry: &CatalogEntry, selected: bool) -> String {
        let preset = &entry.preset;
        format!(
            "{}{} {:<34} {:<22} {:<9} {}",
            if selected { ">" } else { " " },
            if entry.is_favorite { "*" } else { " " },
            preset.name,
            preset.label,
            preset.durations.pattern(),
            Self::session_length(preset.repeat_minutes)
        )
    }

    /// Shows a preset listing.
    pub fn show_presets(entries: &[CatalogEntry], selected: Option<&str>) {
        if entries.is_empty() {
            println!("No presets");
            return;
        }
        for entry in entries {
            let is_selected = selected == Some(entry.preset.name.as_str());
            println!("{}", Self::preset_row(entry, is_selected));
        }
    }

    pub fn show_preset_added(added: &AddedPreset) {
        if added.created {
            println!("* Saved preset {} ({})", added.preset.name, added.preset.label);
        } else {
            println!(
                "* {} already has this configuration",
                added.preset.name
            );
        }
        if added.favorite_changed {
            println!("  Marked favorite");
        }
    }

    pub fn show_preset_removed(name: &str, removal: Removal) {
        match removal {
            Removal::Deleted { .. } => println!("* Deleted preset {}", name),
            Removal::Hidden => println!("* Hid built-in preset {}", name),
            Removal::NotFound => println!("No preset named {}", name),
        }
    }

    pub fn show_favorite(name: &str, favorite: bool) {
        if favorite {
            println!("* {} is now a favorite", name);
        } else {
            println!("* {} is no longer a favorite", name);
        }
    }

    pub fn show_draft_favorite(favorite: bool) {
        if favorite {
            println!("* Current configuration marked favorite");
        } else {
            println!("* Current configuration is no longer a favorite");
        }
    }

    pub fn show_preset_applied(preset: &Preset) {
        println!("* Applied {} ({})", preset.name, preset.label);
        println!("  Pattern: {}", preset.durations.pattern());
        println!("  Length:  {}", Self::session_length(preset.repeat_minutes));
    }

    // ------------------------------------------------------------------------
    // Preferences and Data
    // ------------------------------------------------------------------------

    pub fn show_preferences(preferences: &Preferences) {
        println!("sound:     {}", Self::on_off(preferences.sound_enabled));
        println!("vibration: {}", Self::on_off(preferences.vibration_enabled));
    }

    pub fn show_reset_data() {
        println!("* Cleared saved presets, favorites and hidden presets");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    fn on_off(value: bool) -> &'static str {
        if value {
            "on"
        } else {
            "off"
        }
    }
}
