//! Storage trait definitions.

use crate::StorageResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored value with an optional expiry, cookie style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// True once the expiry has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Key-value persistence backend.
///
/// Backends must treat expired entries as absent.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve an unexpired entry.
    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>>;

    /// Store several entries as one write.
    fn set_entries(&self, entries: &[(&str, StoredEntry)]) -> StorageResult<()>;

    /// Delete a value. Returns whether something was removed.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.get_entry(key)?.map(|entry| entry.value))
    }

    /// Store a single value.
    fn set(&self, key: &str, value: &str, expires_at: Option<DateTime<Utc>>) -> StorageResult<()> {
        self.set_entries(&[(key, StoredEntry::new(value, expires_at))])
    }

    /// Check if a key exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get_entry(key)?.is_some())
    }
}
