//! Configuration management.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

/// Default backend API base URL (can be overridden at compile time via COURSEGATE_API_BASE_URL).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("COURSEGATE_API_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:4000",
};

/// Default edge server listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Lifetime of persisted credentials and the session snapshot (7 days).
pub const DEFAULT_CREDENTIAL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Lifetime of pending signup / password-reset state (15 minutes).
pub const DEFAULT_PENDING_FLOW_TTL_SECS: u64 = 15 * 60;

/// Upper bound for either lifetime (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend REST API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Edge server listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Directory with the built front-end bundle served by the edge server.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    /// Lifetime of stored credentials, in seconds.
    #[serde(default = "default_credential_ttl_secs")]
    pub credential_ttl_secs: u64,
    /// Lifetime of pending signup and password-reset state, in seconds.
    #[serde(default = "default_pending_flow_ttl_secs")]
    pub pending_flow_ttl_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_credential_ttl_secs() -> u64 {
    DEFAULT_CREDENTIAL_TTL_SECS
}

fn default_pending_flow_ttl_secs() -> u64 {
    DEFAULT_PENDING_FLOW_TTL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            listen_addr: default_listen_addr(),
            static_dir: None,
            credential_ttl_secs: DEFAULT_CREDENTIAL_TTL_SECS,
            pending_flow_ttl_secs: DEFAULT_PENDING_FLOW_TTL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the config file (if any), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| CoreError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `COURSEGATE_*` overrides from a variable lookup.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(log_level) = non_empty("COURSEGATE_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(url) = non_empty("COURSEGATE_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(addr) = non_empty("COURSEGATE_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(dir) = non_empty("COURSEGATE_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(dir));
        }
    }

    /// Check that the URL and listen address parse and the lifetimes are in range.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        self.listen_addr()?;
        check_ttl("credential_ttl_secs", self.credential_ttl_secs)?;
        check_ttl("pending_flow_ttl_secs", self.pending_flow_ttl_secs)?;
        Ok(())
    }

    /// Get the API base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// API base URL without a trailing slash, for path concatenation.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Get the listen address as a socket address.
    pub fn listen_addr(&self) -> CoreResult<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|source| CoreError::ListenAddr {
                addr: self.listen_addr.clone(),
                source,
            })
    }
}

fn check_ttl(field: &'static str, secs: u64) -> CoreResult<()> {
    if (1..=MAX_TTL_SECS).contains(&secs) {
        Ok(())
    } else {
        Err(CoreError::Ttl { field, secs })
    }
}
