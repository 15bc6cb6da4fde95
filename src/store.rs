//! Persistence port for progress blobs.
//!
//! The game only ever needs get/set/remove of one string per key. The browser
//! build uses `localStorage`; tests use `MemoryStore`. Failures never reach the
//! player: reads fall back to defaults and writes are logged and dropped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{QuestError, QuestResult};
use crate::progress::ProgressRecord;

pub trait ProgressStore {
    fn load(&self, key: &str) -> QuestResult<Option<String>>;
    fn save(&mut self, key: &str, blob: &str) -> QuestResult<()>;
    fn remove(&mut self, key: &str) -> QuestResult<()>;
}

/// In-memory store. Clones share the same map, so a test can keep a handle
/// and inspect what the session wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, blob: &str) -> Self {
        let s = Self::default();
        s.map.borrow_mut().insert(key.to_string(), blob.to_string());
        s
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, key: &str) -> QuestResult<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&mut self, key: &str, blob: &str) -> QuestResult<()> {
        self.map.borrow_mut().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> QuestResult<()> {
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

/// `window.localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> QuestResult<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| QuestError::Storage("no window".into()))?
            .local_storage()
            .map_err(|_| QuestError::Storage("localStorage access denied".into()))?
            .ok_or_else(|| QuestError::Storage("localStorage unavailable".into()))
    }
}

impl ProgressStore for LocalStorageStore {
    fn load(&self, key: &str) -> QuestResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| QuestError::Storage(format!("read of '{}' failed", key)))
    }

    fn save(&mut self, key: &str, blob: &str) -> QuestResult<()> {
        Self::storage()?
            .set_item(key, blob)
            .map_err(|_| QuestError::Storage(format!("write of '{}' failed", key)))
    }

    fn remove(&mut self, key: &str) -> QuestResult<()> {
        Self::storage()?
            .remove_item(key)
            .map_err(|_| QuestError::Storage(format!("remove of '{}' failed", key)))
    }
}

/// A store bound to one key. Writes are whole-object overwrites.
pub struct Repo<S: ProgressStore> {
    store: S,
    key: String,
}

impl<S: ProgressStore> Repo<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_raw(&self) -> Option<String> {
        match self.store.load(&self.key) {
            Ok(v) => v,
            Err(e) => {
                warn!("store: load '{}' failed, using defaults: {}", self.key, e);
                None
            }
        }
    }

    /// Load any serde value, defaulting on absence or corruption.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self) -> T {
        self.load_or_else(T::default)
    }

    pub fn load_or_else<T: DeserializeOwned>(&self, fresh: impl FnOnce() -> T) -> T {
        let Some(raw) = self.load_raw() else {
            return fresh();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("store: '{}' is corrupt, using defaults: {}", self.key, e);
            fresh()
        })
    }

    pub fn save_value<T: Serialize>(&mut self, value: &T) {
        match serde_json::to_string(value) {
            Ok(blob) => self.write(&blob),
            Err(e) => warn!("store: serialize '{}' failed: {}", self.key, e),
        }
    }

    fn write(&mut self, blob: &str) {
        if let Err(e) = self.store.save(&self.key, blob) {
            warn!("store: save '{}' failed: {}", self.key, e);
        }
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!("store: remove '{}' failed: {}", self.key, e);
        }
        debug!("store: cleared '{}'", self.key);
    }
}

impl<S: ProgressStore> Repo<S> {
    /// Progress load; migration of older blobs runs here.
    pub fn load_progress(&self) -> ProgressRecord {
        match self.load_raw() {
            Some(raw) => ProgressRecord::from_blob(&raw),
            None => ProgressRecord::default(),
        }
    }

    pub fn save_progress(&mut self, record: &ProgressRecord) {
        let blob = record.to_blob();
        self.write(&blob);
    }
}
