//! Preset catalog.
//!
//! The catalog is a pure derivation: visible built-ins in declaration order,
//! then custom presets in creation order, each flagged with favorite
//! membership. Mutations return what changed so the caller can persist it.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::builtin::{builtin_presets, is_builtin_name};
use super::Preset;
use crate::types::DurationSet;

/// A visible preset annotated with its favorite flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub preset: Preset,
    pub is_favorite: bool,
}

/// Result of [`PresetCatalog::add_preset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedPreset {
    /// The new preset, or the existing one with the same configuration
    pub preset: Preset,
    /// False when an existing preset was reused
    pub created: bool,
    /// True when the favorite set gained an entry
    pub favorite_changed: bool,
}

/// Result of [`PresetCatalog::remove_preset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A custom preset was deleted
    Deleted {
        /// It was also dropped from favorites
        was_favorite: bool,
    },
    /// A built-in was hidden
    Hidden,
    /// Unknown or already hidden name; nothing changed
    NotFound,
}

impl Removal {
    /// Returns true if the catalog changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Built-in and custom presets with favorite and hidden overlays.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    builtins: Vec<Preset>,
    custom: Vec<Preset>,
    favorites: BTreeSet<String>,
    hidden: BTreeSet<String>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetCatalog {
    /// Creates a catalog holding only the built-ins.
    pub fn new() -> Self {
        Self {
            builtins: builtin_presets(),
            custom: Vec::new(),
            favorites: BTreeSet::new(),
            hidden: BTreeSet::new(),
        }
    }

    /// Rebuilds a catalog from stored user data.
    ///
    /// Custom entries that would break name uniqueness are dropped, as are
    /// hidden names that do not refer to a built-in.
    pub fn from_stored(custom: Vec<Preset>, favorites: Vec<String>, hidden: Vec<String>) -> Self {
        let mut catalog = Self::new();

        let mut seen: HashSet<String> = HashSet::new();
        for preset in custom {
            if is_builtin_name(&preset.name) || !seen.insert(preset.name.clone()) {
                warn!("Dropping custom preset with duplicate name {}", preset.name);
                continue;
            }
            catalog.custom.push(Preset {
                is_custom: true,
                ..preset
            });
        }

        catalog.favorites = favorites.into_iter().collect();
        catalog.hidden = hidden
            .into_iter()
            .filter(|name| is_builtin_name(name))
            .collect();
        catalog
    }

    fn visible(&self) -> impl Iterator<Item = &Preset> {
        self.builtins
            .iter()
            .filter(|p| !self.hidden.contains(&p.name))
            .chain(self.custom.iter())
    }

    fn entry(&self, preset: &Preset) -> CatalogEntry {
        CatalogEntry {
            preset: preset.clone(),
            is_favorite: self.favorites.contains(&preset.name),
        }
    }

    /// Visible presets in catalog order.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.visible().map(|p| self.entry(p)).collect()
    }

    /// Visible presets flagged favorite, in catalog order.
    pub fn favorites(&self) -> Vec<CatalogEntry> {
        self.visible()
            .filter(|p| self.favorites.contains(&p.name))
            .map(|p| self.entry(p))
            .collect()
    }

    /// First visible preset with exactly this configuration.
    pub fn matching(&self, durations: &DurationSet, repeat_minutes: u32) -> Option<CatalogEntry> {
        self.visible()
            .find(|p| p.has_config(durations, repeat_minutes))
            .map(|p| self.entry(p))
    }

    /// Looks up a preset by name, including hidden built-ins.
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.builtins
            .iter()
            .chain(self.custom.iter())
            .find(|p| p.name == name)
    }

    /// Adds a custom preset unless the configuration already exists.
    ///
    /// When a visible preset already has the same durations and repeat
    /// minutes it is returned instead, and marked favorite if requested.
    pub fn add_preset(
        &mut self,
        label: &str,
        durations: DurationSet,
        repeat_minutes: u32,
        favorite: bool,
    ) -> AddedPreset {
        let existing = self
            .visible()
            .find(|p| p.has_config(&durations, repeat_minutes))
            .cloned();
        if let Some(existing) = existing {
            debug!("Preset {} already has this configuration", existing.name);
            let favorite_changed = favorite && self.favorites.insert(existing.name.clone());
            return AddedPreset {
                preset: existing,
                created: false,
                favorite_changed,
            };
        }

        let preset = Preset::custom(label, durations, repeat_minutes);
        debug!("Created preset {} ({})", preset.name, preset.label);
        self.custom.push(preset.clone());
        let favorite_changed = favorite && self.favorites.insert(preset.name.clone());
        AddedPreset {
            preset,
            created: true,
            favorite_changed,
        }
    }

    /// Deletes a custom preset or hides a built-in.
    pub fn remove_preset(&mut self, name: &str) -> Removal {
        if let Some(index) = self.custom.iter().position(|p| p.name == name) {
            self.custom.remove(index);
            let was_favorite = self.favorites.remove(name);
            return Removal::Deleted { was_favorite };
        }
        if is_builtin_name(name) && self.hidden.insert(name.to_string()) {
            return Removal::Hidden;
        }
        Removal::NotFound
    }

    /// Flips favorite membership of `name` and returns the new state.
    ///
    /// The name is not validated; a favorite for a missing preset is inert.
    pub fn toggle_favorite(&mut self, name: &str) -> bool {
        if self.favorites.remove(name) {
            false
        } else {
            self.favorites.insert(name.to_string());
            true
        }
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorites.contains(name)
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(name)
    }

    pub fn custom_presets(&self) -> &[Preset] {
        &self.custom
    }

    pub fn favorite_names(&self) -> &BTreeSet<String> {
        &self.favorites
    }

    pub fn hidden_names(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    /// Drops custom presets, favorites and hidden flags.
    pub fn clear_user_data(&mut self) {
        self.custom.clear();
        self.favorites.clear();
        self.hidden.clear();
    }
}
