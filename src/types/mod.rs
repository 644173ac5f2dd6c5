//! Core data types for the breathing timer.
//!
//! This module defines the data structures used for:
//! - Breathing phases and their fixed cyclic order
//! - Per-phase duration sets with input normalization
//! - Timer settings and user preferences with serde defaults

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Phase
// ============================================================================

/// One stage of a breath cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Breathing in
    #[default]
    Inhale,
    /// Pause after inhale
    Hold1,
    /// Breathing out
    Exhale,
    /// Pause after exhale
    Hold2,
}

impl Phase {
    /// All phases in cycle order.
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::Hold1, Phase::Exhale, Phase::Hold2];

    /// Position of the phase within [`Phase::ALL`].
    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::Hold1 => 1,
            Phase::Exhale => 2,
            Phase::Hold2 => 3,
        }
    }

    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::Hold1 => "hold1",
            Phase::Exhale => "exhale",
            Phase::Hold2 => "hold2",
        }
    }

    /// Human-facing label. Both holds read the same.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Hold1 | Phase::Hold2 => "Hold",
            Phase::Exhale => "Exhale",
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

// ============================================================================
// Numeric normalization
// ============================================================================

/// Rounds to the nearest whole second and clamps at zero.
///
/// Non-finite input maps to zero; callers that must not silently reset a
/// value should go through [`checked_seconds`] first.
pub fn clamp_seconds(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    // `as` saturates at u32::MAX
    n.round().max(0.0) as u32
}

/// Like [`clamp_seconds`] but rejects `NaN` and infinities.
pub fn checked_seconds(n: f64) -> Option<u32> {
    n.is_finite().then(|| clamp_seconds(n))
}

// ============================================================================
// DurationSet
// ============================================================================

/// Whole-second durations for each of the four phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationSet {
    pub inhale: u32,
    pub hold1: u32,
    pub exhale: u32,
    pub hold2: u32,
}

impl DurationSet {
    /// Creates a duration set from seconds in phase order.
    pub const fn new(inhale: u32, hold1: u32, exhale: u32, hold2: u32) -> Self {
        Self {
            inhale,
            hold1,
            exhale,
            hold2,
        }
    }

    /// Builds a duration set from untrusted numbers, clamping each field.
    ///
    /// Returns `None` if any field is non-finite.
    pub fn from_f64s(inhale: f64, hold1: f64, exhale: f64, hold2: f64) -> Option<Self> {
        Some(Self {
            inhale: checked_seconds(inhale)?,
            hold1: checked_seconds(hold1)?,
            exhale: checked_seconds(exhale)?,
            hold2: checked_seconds(hold2)?,
        })
    }

    /// Seconds configured for `phase`.
    pub fn get(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::Hold1 => self.hold1,
            Phase::Exhale => self.exhale,
            Phase::Hold2 => self.hold2,
        }
    }

    /// Sets the seconds for `phase`.
    pub fn set(&mut self, phase: Phase, seconds: u32) {
        match phase {
            Phase::Inhale => self.inhale = seconds,
            Phase::Hold1 => self.hold1 = seconds,
            Phase::Exhale => self.exhale = seconds,
            Phase::Hold2 => self.hold2 = seconds,
        }
    }

    /// Returns a copy with `phase` set to `seconds`.
    pub fn with(mut self, phase: Phase, seconds: u32) -> Self {
        self.set(phase, seconds);
        self
    }

    /// Duration of `phase` as a [`Duration`].
    pub fn phase_duration(&self, phase: Phase) -> Duration {
        Duration::from_secs(u64::from(self.get(phase)))
    }

    /// Duration of `phase` in milliseconds.
    pub fn phase_ms(&self, phase: Phase) -> u64 {
        u64::from(self.get(phase)) * 1000
    }

    /// Sum of all four phases in seconds.
    pub fn total_seconds(&self) -> u64 {
        Phase::ALL.iter().map(|&p| u64::from(self.get(p))).sum()
    }

    /// Length of one full cycle.
    pub fn cycle_duration(&self) -> Duration {
        Duration::from_secs(self.total_seconds())
    }

    /// True when every phase is zero, i.e. there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.total_seconds() == 0
    }

    /// Dash-joined compact form, e.g. `4-0-6-0`.
    pub fn pattern(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.inhale, self.hold1, self.exhale, self.hold2
        )
    }
}

/// Field-wise equality of two duration sets.
pub fn durations_equal(a: &DurationSet, b: &DurationSet) -> bool {
    a.inhale == b.inhale && a.hold1 == b.hold1 && a.exhale == b.exhale && a.hold2 == b.hold2
}

/// Two configurations are the same iff durations and repeat minutes match.
pub fn same_config(a: &DurationSet, a_repeat: u32, b: &DurationSet, b_repeat: u32) -> bool {
    durations_equal(a, b) && a_repeat == b_repeat
}

/// Draft durations a fresh engine starts with.
pub const DEFAULT_DURATIONS: DurationSet = DurationSet::new(4, 0, 6, 0);

/// Session length a fresh engine starts with, in minutes.
pub const DEFAULT_REPEAT_MINUTES: u32 = 5;

// ============================================================================
// TimerSettings
// ============================================================================

fn default_prepare_seconds() -> u64 {
    3
}

fn default_max_refresh_ms() -> u64 {
    100
}

fn default_min_delay_ms() -> u64 {
    5
}

/// Timing knobs for the engine and its tick driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Length of the pre-start countdown in seconds.
    #[serde(default = "default_prepare_seconds")]
    pub prepare_seconds: u64,

    /// Longest the driver sleeps between display refreshes.
    #[serde(default = "default_max_refresh_ms")]
    pub max_refresh_ms: u64,

    /// Floor for the driver's sleep, so it never spins.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            prepare_seconds: default_prepare_seconds(),
            max_refresh_ms: default_max_refresh_ms(),
            min_delay_ms: default_min_delay_ms(),
        }
    }
}

impl TimerSettings {
    /// Pre-start countdown window.
    pub fn prepare_window(&self) -> Duration {
        Duration::from_secs(self.prepare_seconds)
    }

    /// Upper bound for a single driver sleep.
    pub fn max_refresh(&self) -> Duration {
        Duration::from_millis(self.max_refresh_ms)
    }

    /// Lower bound for a single driver sleep.
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms.min(self.max_refresh_ms))
    }
}

// ============================================================================
// Preferences
// ============================================================================

fn default_true() -> bool {
    true
}

/// Cue preferences chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Play a phase tone when a phase begins.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    /// Fire a haptic pulse when a phase begins.
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
