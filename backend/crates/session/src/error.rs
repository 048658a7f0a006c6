//! Session Error Types
//!
//! This module provides session-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::token::ParseError;
use thiserror::Error;

/// Session-specific result type alias
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific error variants
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session not found, expired, or the cookie failed verification
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Anti-forgery token mismatch on a state-changing request
    #[error("Anti-forgery token mismatch")]
    AntiForgeryMismatch,

    /// Credential token could not be parsed; handled like an expired one
    #[error("Invalid credential token")]
    TokenParse(#[from] ParseError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::SessionInvalid | SessionError::TokenParse(_) => StatusCode::UNAUTHORIZED,
            SessionError::AntiForgeryMismatch => StatusCode::FORBIDDEN,
            SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::SessionInvalid | SessionError::TokenParse(_) => ErrorKind::Unauthorized,
            SessionError::AntiForgeryMismatch => ErrorKind::Forbidden,
            SessionError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError.
    ///
    /// The user-facing message stays generic; internal detail is logged only.
    pub fn to_app_error(&self) -> AppError {
        match self {
            SessionError::SessionInvalid | SessionError::TokenParse(_) => {
                AppError::new(self.kind(), "Session ended").with_action("Please sign in again")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            SessionError::Internal(msg) => {
                tracing::error!(message = %msg, "Session internal error");
            }
            SessionError::AntiForgeryMismatch => {
                tracing::warn!("Anti-forgery token mismatch detected");
            }
            SessionError::TokenParse(e) => {
                tracing::warn!(error = %e, "Credential token rejected");
            }
            SessionError::SessionInvalid => {
                tracing::debug!("Request without valid session");
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SessionError::SessionInvalid.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SessionError::AntiForgeryMismatch.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SessionError::TokenParse(ParseError::MissingExpiry).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SessionError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_generic_user_facing_message() {
        let err = SessionError::TokenParse(ParseError::MissingExpiry).to_app_error();
        assert_eq!(err.message(), "Session ended");
        assert_eq!(err.action(), Some("Please sign in again"));
    }
}
