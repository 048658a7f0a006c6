//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// MFA code, when the account has MFA enrolled or must enroll
    pub mfa_code: Option<String>,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// One of "authenticated", "mfaRequired", "mfaSetupRequired"
    pub status: &'static str,
    /// Anti-forgery token to echo in `X-CSRF-Token`; present when
    /// authenticated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_forgery_token: Option<String>,
    /// Session expiry; present when authenticated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<i64>,
}

impl LoginResponse {
    pub fn authenticated(anti_forgery_token: String, expires_at_ms: i64) -> Self {
        Self {
            status: "authenticated",
            anti_forgery_token: Some(anti_forgery_token),
            expires_at_ms: Some(expires_at_ms),
        }
    }

    pub fn mfa_required() -> Self {
        Self {
            status: "mfaRequired",
            anti_forgery_token: None,
            expires_at_ms: None,
        }
    }

    pub fn mfa_setup_required() -> Self {
        Self {
            status: "mfaSetupRequired",
            anti_forgery_token: None,
            expires_at_ms: None,
        }
    }
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<i64>,
}

// ============================================================================
// Logout
// ============================================================================

/// Logout response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub signed_out: bool,
}
