use std::net::AddrParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid API base URL: {0}")]
    ApiBaseUrl(#[from] url::ParseError),

    #[error("Invalid listen address {addr}: {source}")]
    ListenAddr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("Malformed config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} must be between 1 and 31536000 seconds, got {secs}")]
    Ttl { field: &'static str, secs: u64 },

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
