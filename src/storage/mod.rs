//! Key-value persistence for presets and preferences.
//!
//! The timer core never touches storage. The controller loads configuration
//! through a [`KeyValueStore`] at startup and writes changes back
//! fire-and-forget; values are plain strings, usually JSON.
//!
//! # Backends
//!
//! - [`FileStore`]: a single JSON object file, used by the CLI
//! - [`MemoryStore`]: in-process map with failure injection, used in tests
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `breathe.presets.custom` | JSON array of custom presets |
//! | `breathe.presets.favorites` | JSON array of preset names |
//! | `breathe.presets.hidden` | JSON array of hidden built-in names |
//! | `breathe.presets.last` | name of the last applied preset |
//! | `breathe.preferences.soundEnabled` | `"true"` or `"false"` |
//! | `breathe.preferences.vibrationEnabled` | `"true"` or `"false"` |

pub mod error;
pub mod file;
pub mod memory;

pub use error::StorageError;
pub use file::{default_store_path, FileStore};
pub use memory::MemoryStore;

/// Storage keys.
pub mod keys {
    pub const CUSTOM_PRESETS: &str = "breathe.presets.custom";
    pub const FAVORITES: &str = "breathe.presets.favorites";
    pub const HIDDEN: &str = "breathe.presets.hidden";
    pub const LAST_PRESET: &str = "breathe.presets.last";
    pub const SOUND_ENABLED: &str = "breathe.preferences.soundEnabled";
    pub const VIBRATION_ENABLED: &str = "breathe.preferences.vibrationEnabled";

    /// Keys removed by a saved-data reset. Preferences survive it.
    pub const PRESET_KEYS: [&str; 4] = [CUSTOM_PRESETS, FAVORITES, HIDDEN, LAST_PRESET];
}

/// Asynchronous string key-value store.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Returns the value for `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
