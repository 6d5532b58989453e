//! File system paths used by coursegate.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Resolves every on-disk location from one base directory.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.coursegate)
    base_dir: PathBuf,
}

impl Paths {
    /// Use `~/.coursegate` as the base directory.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or(CoreError::NoHomeDir)?;

        Ok(Self {
            base_dir: home.join(".coursegate"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.coursegate).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.coursegate/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Persisted cookie jar holding credentials and flow state.
    pub fn cookie_jar_file(&self) -> PathBuf {
        self.base_dir.join("cookies.json")
    }

    /// Get the logs directory (~/.coursegate/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("coursegate.jsonl")
    }

    /// Ensure the base and logs directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
