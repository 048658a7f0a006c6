//! Vault Error Types
//!
//! Client-side errors integrate with the unified `kernel::error::AppError`
//! system when surfaced over HTTP. Expired or invalid cache entries are not
//! errors at all: the cache recovers them locally as "no credential".

use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::token::ParseError;
use thiserror::Error;

use crate::domain::value_object::auth_state::AuthState;

/// Vault-specific result type alias
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault-specific error variants
#[derive(Debug, Error)]
pub enum VaultError {
    /// Storage or obfuscation failure; fail-secure, never a plaintext
    /// fallback
    #[error("Credential storage failed: {0}")]
    Storage(String),

    /// Credential token could not be parsed; handled like an expired one
    #[error("Invalid credential token")]
    TokenParse(#[from] ParseError),

    /// Login collaborator rejected the credentials
    #[error("Invalid credentials")]
    LoginRejected,

    /// Login collaborator rejected the multi-factor code
    #[error("Invalid multi-factor code")]
    MfaRejected,

    /// Credential refresh failed; forces logout, not retried locally
    #[error("Credential refresh failed: {0}")]
    RefreshFailed(String),

    /// Attempted a transition outside the auth state table; a programming
    /// error, surfaced loudly rather than clamped
    #[error("Invalid auth state transition: {from} -> {to}")]
    InvalidTransition { from: AuthState, to: AuthState },

    /// HTTP transport failure talking to a collaborator
    #[error("HTTP error: {0}")]
    Http(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::LoginRejected | VaultError::MfaRejected | VaultError::TokenParse(_) => {
                ErrorKind::Unauthorized
            }
            VaultError::RefreshFailed(_) => ErrorKind::Unauthorized,
            VaultError::Storage(_)
            | VaultError::InvalidTransition { .. }
            | VaultError::Http(_)
            | VaultError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError.
    ///
    /// Internal detail never reaches the user; unauthorized outcomes all
    /// read as the same generic condition.
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::Unauthorized => match self {
                VaultError::LoginRejected => AppError::unauthorized("Invalid credentials"),
                VaultError::MfaRejected => AppError::unauthorized("Invalid multi-factor code"),
                _ => AppError::unauthorized("Session ended").with_action("Please sign in again"),
            },
            kind => AppError::new(kind, "Internal error"),
        }
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(err: reqwest::Error) -> Self {
        VaultError::Http(err.to_string())
    }
}
