//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Refresh failed or no refresh token was available; credentials are gone
    #[error("Session expired")]
    SessionExpired,

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] coursegate_storage::StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns true if the caller no longer holds a usable session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::SessionExpired | AuthError::Api { status: 401, .. }
        )
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
