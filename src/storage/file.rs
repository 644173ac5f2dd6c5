//! JSON file store.
//!
//! The whole store is one JSON object of string values. Every write rewrites
//! the file through a temporary sibling and a rename, so a crash mid-write
//! leaves the previous contents intact.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Default store location: `~/.breathe/store.json`.
///
/// # Errors
///
/// Returns [`StorageError::HomeDirectoryNotFound`] if the home directory
/// cannot be determined.
pub fn default_store_path() -> Result<PathBuf, StorageError> {
    let home_dir = dirs::home_dir().ok_or(StorageError::HomeDirectoryNotFound)?;
    Ok(home_dir.join(".breathe").join("store.json"))
}

/// [`KeyValueStore`] backed by a JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole map. A missing file is empty; an unparsable one is
    /// logged and treated as empty so the next write replaces it.
    ///
    /// Entries whose value is not a string are dropped one by one, so the
    /// rest of the store survives the next write.
    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Read(e)),
        };

        let entries = match serde_json::from_str::<BTreeMap<String, Value>>(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable store {}: {}", self.path.display(), e);
                return Ok(BTreeMap::new());
            }
        };

        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(value) => Some((key, value)),
                other => {
                    warn!("Dropping non-string store entry {}: {}", key, other);
                    None
                }
            })
            .collect())
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(StorageError::Write)?;
            }
        }

        let json = serde_json::to_string_pretty(map).map_err(StorageError::Serialize)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await.map_err(StorageError::Write)?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(StorageError::Write)?;
        debug!("Store written to {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.save(&map).await
    }
}
