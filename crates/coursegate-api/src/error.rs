//! API client error types.

use crate::validation::ValidationErrors;
use coursegate_auth::AuthError;
use coursegate_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Gateway, session or backend failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Flow state could not be written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input rejected before any network call
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    /// OTP step reached without a signup in progress (or it expired)
    #[error("No signup in progress")]
    NoPendingSignup,

    /// Reset step reached without a reset in progress (or it expired)
    #[error("No password reset in progress")]
    NoPendingReset,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ApiError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Auth(e) if e.is_unauthenticated())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
