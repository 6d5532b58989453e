//! In-process backend.

use crate::{KeyValueStore, StorageResult, StoredEntry};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Volatile store, used for tests and for processes that must not persist
/// credentials.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>> {
        let mut data = self.data.lock();
        match data.get(key) {
            Some(entry) if entry.is_expired_at(Utc::now()) => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    fn set_entries(&self, entries: &[(&str, StoredEntry)]) -> StorageResult<()> {
        let mut data = self.data.lock();
        for (key, entry) in entries {
            data.insert((*key).to_string(), entry.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        Ok(self.data.lock().remove(key).is_some())
    }
}
