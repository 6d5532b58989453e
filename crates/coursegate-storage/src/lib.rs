//! Credential and flow-state storage for coursegate.
//!
//! Two backends are provided:
//! - **FileStore**: JSON cookie jar on disk, used by the CLI
//! - **MemoryStore**: process-local map, used by tests and embedders

mod file;
mod keys;
mod memory;
mod token_store;
mod traits;

pub use file::FileStore;
pub use keys::StorageKeys;
pub use memory::MemoryStore;
pub use token_store::{CredentialPair, TokenKind, TokenStore};
pub use traits::{KeyValueStore, StoredEntry};

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Entry lifetime too large to compute an expiry
    #[error("Entry lifetime of {0} seconds is out of range")]
    Lifetime(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
