//! Breathing session controller.
//!
//! Owns one timer engine, its tick driver, the preset catalog and the user's
//! preferences, and persists configuration changes through a
//! [`KeyValueStore`]. This is the object a presentation layer holds.
//!
//! Persistence is fire-and-forget: a failed read falls back to defaults and
//! a failed write is logged, while the in-memory state stays authoritative.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::presets::codec::{decode_custom_presets, decode_names, encode_custom_presets, encode_names};
use crate::presets::{AddedPreset, CatalogEntry, Preset, PresetCatalog, Removal};
use crate::storage::{keys, KeyValueStore};
use crate::timer::{SharedEngine, Ticker, TimerEngine, TimerError, TimerEvent, TimerSnapshot};
use crate::types::{DurationSet, Phase, Preferences, TimerSettings};

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Breathing timer with presets, preferences and persistence.
pub struct BreathingController<S> {
    engine: SharedEngine,
    ticker: Option<Ticker>,
    catalog: PresetCatalog,
    store: S,
    preferences: watch::Sender<Preferences>,
    last_preset: Option<String>,
}

impl<S: KeyValueStore> BreathingController<S> {
    /// Creates a controller with default configuration.
    ///
    /// Returns the receiving end of the engine's event channel, typically
    /// handed to a [`crate::cues::CueDispatcher`]. Call
    /// [`BreathingController::load`] to restore saved data.
    pub fn new(store: S, settings: TimerSettings) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(settings, event_tx);
        let (preferences, _) = watch::channel(Preferences::default());
        let controller = Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: None,
            catalog: PresetCatalog::new(),
            store,
            preferences,
            last_preset: None,
        };
        (controller, event_rx)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Restores presets, preferences and the last applied preset.
    ///
    /// Every key is optional; unreadable or malformed data falls back to
    /// its default.
    pub async fn load(&mut self) {
        let custom = self
            .read(keys::CUSTOM_PRESETS)
            .await
            .map(|raw| decode_custom_presets(&raw))
            .unwrap_or_default();
        let favorites = self
            .read(keys::FAVORITES)
            .await
            .map(|raw| decode_names(&raw))
            .unwrap_or_default();
        let hidden = self
            .read(keys::HIDDEN)
            .await
            .map(|raw| decode_names(&raw))
            .unwrap_or_default();
        self.catalog = PresetCatalog::from_stored(custom, favorites, hidden);

        let defaults = Preferences::default();
        let sound_enabled = self
            .read(keys::SOUND_ENABLED)
            .await
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(defaults.sound_enabled);
        let vibration_enabled = self
            .read(keys::VIBRATION_ENABLED)
            .await
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(defaults.vibration_enabled);
        self.preferences.send_replace(Preferences {
            sound_enabled,
            vibration_enabled,
        });

        if let Some(name) = self.read(keys::LAST_PRESET).await {
            match self.catalog.find(&name).cloned() {
                Some(preset) => {
                    self.engine
                        .lock()
                        .await
                        .apply_configuration(preset.durations, preset.repeat_minutes);
                    debug!("Restored last preset {}", name);
                    self.last_preset = Some(name);
                }
                None => debug!("Last preset {} no longer exists", name),
            }
        }

        info!(
            "Loaded {} custom preset(s), {} favorite(s)",
            self.catalog.custom_presets().len(),
            self.catalog.favorite_names().len()
        );
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value).await {
            warn!("Failed to save {}: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!("Failed to delete {}: {}", key, e);
        }
    }

    async fn persist_custom(&self) {
        match encode_custom_presets(self.catalog.custom_presets()) {
            Ok(raw) => self.write(keys::CUSTOM_PRESETS, &raw).await,
            Err(e) => warn!("Failed to encode custom presets: {}", e),
        }
    }

    async fn persist_favorites(&self) {
        match encode_names(self.catalog.favorite_names()) {
            Ok(raw) => self.write(keys::FAVORITES, &raw).await,
            Err(e) => warn!("Failed to encode favorites: {}", e),
        }
    }

    async fn persist_hidden(&self) {
        match encode_names(self.catalog.hidden_names()) {
            Ok(raw) => self.write(keys::HIDDEN, &raw).await,
            Err(e) => warn!("Failed to encode hidden presets: {}", e),
        }
    }

    // ------------------------------------------------------------------------
    // Draft configuration
    // ------------------------------------------------------------------------

    /// Sets one draft phase. Returns false if the input was rejected.
    pub async fn set_draft_field(&self, phase: Phase, seconds: f64) -> bool {
        self.engine.lock().await.set_draft_field(phase, seconds)
    }

    /// Sets the session length. Returns false if the input was rejected.
    pub async fn set_repeat_minutes(&self, minutes: f64) -> bool {
        self.engine.lock().await.set_repeat_minutes(minutes)
    }

    // ------------------------------------------------------------------------
    // Run control
    // ------------------------------------------------------------------------

    /// Starts the pre-start countdown and the tick driver.
    ///
    /// # Errors
    ///
    /// Returns the engine's refusal if already running or the draft is
    /// all zeros.
    pub async fn start(&mut self) -> Result<(), TimerError> {
        self.engine.lock().await.start(Instant::now())?;
        self.ticker = Some(Ticker::spawn(self.engine.clone()));
        Ok(())
    }

    /// Stops the driver and freezes the timer. Returns false if idle.
    pub async fn pause(&mut self) -> bool {
        self.ticker = None;
        self.engine.lock().await.pause(Instant::now())
    }

    /// Pauses if running, otherwise starts.
    ///
    /// # Errors
    ///
    /// Propagates the refusal from [`BreathingController::start`].
    pub async fn toggle_run(&mut self) -> Result<(), TimerError> {
        if self.is_running().await {
            self.pause().await;
            Ok(())
        } else {
            self.start().await
        }
    }

    /// Stops the driver and resets the timer to the draft.
    pub async fn reset(&mut self) {
        self.ticker = None;
        self.engine.lock().await.reset();
    }

    pub async fn is_running(&self) -> bool {
        self.engine.lock().await.is_running()
    }

    /// Read-only view of the timer.
    pub async fn snapshot(&self) -> TimerSnapshot {
        self.engine.lock().await.snapshot()
    }

    /// Handle to the shared engine.
    pub fn engine(&self) -> SharedEngine {
        self.engine.clone()
    }

    // ------------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------------

    /// Visible presets in catalog order.
    pub fn presets(&self) -> Vec<CatalogEntry> {
        self.catalog.catalog()
    }

    /// Visible favorite presets in catalog order.
    pub fn favorites(&self) -> Vec<CatalogEntry> {
        self.catalog.favorites()
    }

    /// Looks up a preset by name, including hidden built-ins.
    pub fn find_preset(&self, name: &str) -> Option<&Preset> {
        self.catalog.find(name)
    }

    /// The visible preset matching the current draft, if any.
    pub async fn matching_preset(&self) -> Option<CatalogEntry> {
        let (draft, repeat_minutes) = self.draft_config().await;
        self.catalog.matching(&draft, repeat_minutes)
    }

    async fn draft_config(&self) -> (DurationSet, u32) {
        let engine = self.engine.lock().await;
        (engine.draft(), engine.repeat_minutes())
    }

    pub fn last_preset(&self) -> Option<&str> {
        self.last_preset.as_deref()
    }

    /// Overwrites the draft with a preset and remembers it as last used.
    ///
    /// Unknown names are a no-op and return `None`.
    pub async fn apply_preset(&mut self, name: &str) -> Option<Preset> {
        let Some(preset) = self.catalog.find(name).cloned() else {
            debug!("Ignoring unknown preset {}", name);
            return None;
        };
        self.engine
            .lock()
            .await
            .apply_configuration(preset.durations, preset.repeat_minutes);
        self.last_preset = Some(preset.name.clone());
        self.write(keys::LAST_PRESET, &preset.name).await;
        info!("Applied preset {}", preset.name);
        Some(preset)
    }

    /// Adds a custom preset, reusing an existing one with the same
    /// configuration.
    pub async fn add_preset(
        &mut self,
        label: &str,
        durations: DurationSet,
        repeat_minutes: u32,
        favorite: bool,
    ) -> AddedPreset {
        let added = self
            .catalog
            .add_preset(label, durations, repeat_minutes, favorite);
        if added.created {
            self.persist_custom().await;
        }
        if added.favorite_changed {
            self.persist_favorites().await;
        }
        added
    }

    /// Deletes a custom preset or hides a built-in.
    pub async fn remove_preset(&mut self, name: &str) -> Removal {
        let removal = self.catalog.remove_preset(name);
        match removal {
            Removal::Deleted { was_favorite } => {
                self.persist_custom().await;
                if was_favorite {
                    self.persist_favorites().await;
                }
            }
            Removal::Hidden => self.persist_hidden().await,
            Removal::NotFound => debug!("Nothing to remove for {}", name),
        }
        removal
    }

    /// Flips a preset's favorite flag and returns the new state.
    pub async fn toggle_favorite(&mut self, name: &str) -> bool {
        let favorite = self.catalog.toggle_favorite(name);
        self.persist_favorites().await;
        favorite
    }

    /// Toggles favorite on whatever preset matches the draft.
    ///
    /// With no matching preset, the draft is saved as a new custom preset
    /// marked favorite. Returns the resulting favorite state.
    pub async fn toggle_draft_favorite(&mut self, label: &str) -> bool {
        let (draft, repeat_minutes) = self.draft_config().await;
        match self.catalog.matching(&draft, repeat_minutes) {
            Some(entry) => self.toggle_favorite(&entry.preset.name).await,
            None => {
                self.add_preset(label, draft, repeat_minutes, true).await;
                true
            }
        }
    }

    /// Forgets custom presets, favorites, hidden built-ins and the last
    /// preset. Preferences and the current draft are kept.
    pub async fn clear_saved_data(&mut self) {
        self.catalog.clear_user_data();
        self.last_preset = None;
        for key in keys::PRESET_KEYS {
            self.remove(key).await;
        }
        info!("Cleared saved preset data");
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    pub fn preferences(&self) -> Preferences {
        *self.preferences.borrow()
    }

    /// Receiver that observes preference changes, for a cue dispatcher.
    pub fn subscribe_preferences(&self) -> watch::Receiver<Preferences> {
        self.preferences.subscribe()
    }

    /// Replaces preferences and persists both flags.
    pub async fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences.send_replace(preferences);
        self.write(keys::SOUND_ENABLED, flag(preferences.sound_enabled))
            .await;
        self.write(keys::VIBRATION_ENABLED, flag(preferences.vibration_enabled))
            .await;
    }
}
