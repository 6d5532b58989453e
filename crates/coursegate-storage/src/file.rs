//! JSON cookie-jar file backend.
//!
//! The whole jar is kept in memory and rewritten on every mutation through a
//! temporary file and a rename, so a crash never leaves a half-written jar.

use crate::{KeyValueStore, StorageError, StorageResult, StoredEntry};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Jar = BTreeMap<String, StoredEntry>;

/// Durable store backed by a single JSON file.
pub struct FileStore {
    path: PathBuf,
    jar: Mutex<Jar>,
}

impl FileStore {
    /// Open (or lazily create) the jar at `path`.
    ///
    /// An unreadable or corrupt jar is replaced by an empty one; the user
    /// simply has to log in again.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let jar = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Jar>(&content) {
                Ok(jar) => jar,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cookie jar is corrupt, starting empty");
                    Jar::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Jar::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        debug!(path = %path.display(), entries = jar.len(), "Opened cookie jar");

        Ok(Self {
            path,
            jar: Mutex::new(jar),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, jar: &Jar) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(jar)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> StorageResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> StorageResult<()> {
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get_entry(&self, key: &str) -> StorageResult<Option<StoredEntry>> {
        let jar = self.jar.lock();
        Ok(jar
            .get(key)
            .filter(|entry| !entry.is_expired_at(Utc::now()))
            .cloned())
    }

    fn set_entries(&self, entries: &[(&str, StoredEntry)]) -> StorageResult<()> {
        let mut jar = self.jar.lock();
        let now = Utc::now();
        let mut next: Jar = jar
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        for (key, entry) in entries {
            next.insert((*key).to_string(), entry.clone());
        }

        // Memory only changes once the file does.
        self.persist(&next)?;
        *jar = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut jar = self.jar.lock();
        let removed = jar.remove(key).is_some();
        if removed {
            self.persist(&jar)?;
        }
        Ok(removed)
    }
}
