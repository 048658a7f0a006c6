//! Session Record Entity
//!
//! One record per active browser session. The store is the sole owner of
//! the wrapped credential's lifetime; the browser only ever sees the
//! opaque session id.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::SessionId;
use kernel::token::CredentialToken;

/// Server-side session record
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Opaque session id (UUID v4, 128 bits of randomness)
    pub session_id: SessionId,
    /// The real bearer credential; never crosses into the cookie
    pub credential: CredentialToken,
    /// Owning user id
    pub owner_user_id: String,
    /// Per-session secret required on state-changing requests
    pub anti_forgery_token: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
}

impl SessionRecord {
    /// Create a new session record.
    ///
    /// Expiry comes from the configured session lifetime, not from the
    /// credential's own expiry: an auto-refreshing session legitimately
    /// outlives the credential it was created with.
    pub fn new(
        credential: CredentialToken,
        owner_user_id: impl Into<String>,
        anti_forgery_token: String,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id: SessionId::new(),
            credential,
            owner_user_id: owner_user_id.into(),
            anti_forgery_token,
            created_at: now,
            expires_at_ms: now.timestamp_millis() + lifetime.as_millis() as i64,
        }
    }

    /// Check if the session has expired at the given clock
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }

    /// Check if the session has expired against the wall clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp_millis())
    }

    /// Get remaining time until expiration
    pub fn remaining_ms(&self) -> i64 {
        let now_ms = Utc::now().timestamp_millis();
        (self.expires_at_ms - now_ms).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token(exp_secs: i64) -> CredentialToken {
        let claims = serde_json::json!({"sub": "user-1", "exp": exp_secs});
        let raw = format!(
            "{}.{}.{}",
            platform::crypto::to_base64url(br#"{"alg":"HS256","typ":"JWT"}"#),
            platform::crypto::to_base64url(&serde_json::to_vec(&claims).unwrap()),
            platform::crypto::to_base64url(b"sig"),
        );
        CredentialToken::parse(&raw).unwrap()
    }

    #[test]
    fn test_expiry_follows_configured_lifetime_not_credential() {
        // Credential expires in one second; session lifetime is one day
        let near_expiry = Utc::now().timestamp() + 1;
        let record = SessionRecord::new(
            sample_token(near_expiry),
            "user-1",
            "csrf".to_string(),
            Duration::from_secs(24 * 3600),
        );

        let remaining = record.remaining_ms();
        assert!(remaining > 23 * 3600 * 1000);
        assert!(!record.is_expired());
    }

    #[test]
    fn test_is_expired_boundaries() {
        let record = SessionRecord::new(
            sample_token(Utc::now().timestamp() + 3600),
            "user-1",
            "csrf".to_string(),
            Duration::from_secs(60),
        );

        assert!(!record.is_expired_at(record.expires_at_ms));
        assert!(record.is_expired_at(record.expires_at_ms + 1));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionRecord::new(
            sample_token(Utc::now().timestamp() + 3600),
            "user-1",
            "csrf".to_string(),
            Duration::from_secs(60),
        );
        let b = SessionRecord::new(
            sample_token(Utc::now().timestamp() + 3600),
            "user-1",
            "csrf".to_string(),
            Duration::from_secs(60),
        );
        assert_ne!(a.session_id, b.session_id);
    }
}
