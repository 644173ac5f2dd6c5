//! Preset library for the breathing timer.
//!
//! This module provides named, reusable configurations:
//! - `builtin`: The compiled-in preset list
//! - `catalog`: Merges built-ins with custom presets under favorite/hidden overlays
//! - `codec`: Lenient JSON encoding for persisted presets and name lists

pub mod builtin;
pub mod catalog;
pub mod codec;

use serde::Serialize;
use uuid::Uuid;

use crate::types::{same_config, DurationSet};

pub use builtin::{builtin_presets, is_builtin_name};
pub use catalog::{AddedPreset, CatalogEntry, PresetCatalog, Removal};

/// A named phase-duration and session-length configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Unique identifier
    pub name: String,
    /// Display text
    pub label: String,
    pub durations: DurationSet,
    /// Session length, 0 for unlimited
    pub repeat_minutes: u32,
    pub is_custom: bool,
}

impl Preset {
    /// Creates a custom preset with a freshly generated name.
    ///
    /// A blank label falls back to the duration pattern, e.g. `4-0-6-0`.
    pub fn custom(label: &str, durations: DurationSet, repeat_minutes: u32) -> Self {
        let label = label.trim();
        let label = if label.is_empty() {
            durations.pattern()
        } else {
            label.to_string()
        };
        Self {
            name: format!("custom_{}", Uuid::new_v4().simple()),
            label,
            durations,
            repeat_minutes,
            is_custom: true,
        }
    }

    /// True if this preset has exactly the given configuration.
    pub fn has_config(&self, durations: &DurationSet, repeat_minutes: u32) -> bool {
        same_config(&self.durations, self.repeat_minutes, durations, repeat_minutes)
    }
}
