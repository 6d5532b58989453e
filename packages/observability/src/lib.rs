//! # Observability
//!
//! Shared logging layer for the coursegate crates.
//!
//! Services are log producers only. They call [`init`] or [`init_with_config`]
//! once at startup and use the standard `tracing` macros everywhere else.
//! Every event becomes one JSON line in `~/.coursegate/logs/coursegate.jsonl`
//! (or the configured path), optionally mirrored to stderr in compact form.
//!
//! Credential-bearing fields (`access_token`, `refresh_token`, `password`,
//! `authorization`, `cookie`, `otp`) are redacted before they are written.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "edge".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod json_layer;
mod writer;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{LogFileWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "edge", "cli").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.coursegate/logs/coursegate.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Default log file location.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".coursegate")
            .join("logs")
            .join("coursegate.jsonl")
    })
}

/// Initialize the observability layer with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// If the log file cannot be opened, logging continues on stderr only.
pub fn init_with_config(config: LogConfig) {
    let log_path = config.log_path.clone().or_else(default_log_path);

    let file_writer = match log_path.as_ref().map(LogFileWriter::new) {
        Some(Ok(writer)) => Some(writer),
        Some(Err(e)) => {
            eprintln!("observability: failed to open log file {:?}: {}", log_path, e);
            None
        }
        None => None,
    };
    let file_enabled = file_writer.is_some();

    let json_layer = file_writer.map(|writer| {
        JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
            .with_filter(env_filter(&config.default_level))
    });

    // Without a file, stderr is the only sink left.
    let stderr_layer = if config.also_stderr || !file_enabled {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(
            service = %config.service_name,
            log_path = ?log_path,
            "observability initialized"
        );
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
