//! In-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{KeyValueStore, StorageError};

/// Map-backed [`KeyValueStore`] with failure injection.
///
/// When failing, reads and writes both return
/// [`StorageError::Unavailable`] and leave the map untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    should_fail: AtomicBool,
    write_count: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut map) = store.entries.lock() {
            map.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        }
        store
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Synchronous peek at a stored value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Number of successful set/delete calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("simulated failure".to_string()));
        }
        Ok(())
    }

    fn with_map<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T, StorageError> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))?;
        Ok(f(&mut map))
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        self.with_map(|map| map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.with_map(|map| map.insert(key.to_string(), value.to_string()))?;
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.with_map(|map| map.remove(key))?;
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
