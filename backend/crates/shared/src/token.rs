//! Credential Claims Token
//!
//! The bearer credential issued by the identity service: three dot-separated
//! base64url segments (header, claims, signature). Only the claims segment is
//! decoded here. Signature trust is established by the issuing service and
//! verified there; decoded claims drive UI and refresh-timing decisions only,
//! never access grants.
//!
//! A token whose expiry claim is missing or non-numeric does not parse.
//! Callers treat that outcome exactly like an already-expired token.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use thiserror::Error;

/// Claims parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Token does not have exactly three segments
    #[error("Malformed token structure: expected 3 segments, got {segments}")]
    MalformedStructure { segments: usize },

    /// Claims segment is not valid base64url
    #[error("Claims segment is not valid base64url")]
    InvalidEncoding,

    /// Claims segment is not a JSON object
    #[error("Claims segment is not a JSON object")]
    InvalidClaims,

    /// `sub` claim absent or not a string
    #[error("Missing subject claim")]
    MissingSubject,

    /// `exp` claim absent or non-numeric; treated as already expired
    #[error("Missing or non-numeric expiry claim")]
    MissingExpiry,
}

/// Immutable credential token decoded from its claims segment.
///
/// A refreshed credential is a new `CredentialToken` replacing the old one;
/// instances are never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken {
    raw: String,
    subject: String,
    issued_at_ms: Option<i64>,
    expires_at_ms: i64,
    hashed_user_id: Option<String>,
    hashed_group_id: Option<String>,
}

impl CredentialToken {
    /// Parse a raw token string.
    ///
    /// Splits on `'.'` into exactly three segments and decodes the middle
    /// segment as base64url JSON claims. `sub` and a numeric `exp` are
    /// required; `iat`, `huid`, `hgid` are optional.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(ParseError::MalformedStructure {
                segments: segments.len(),
            });
        }

        let payload = decode_segment(segments[1])?;
        let claims: serde_json::Map<String, Value> =
            serde_json::from_slice(&payload).map_err(|_| ParseError::InvalidClaims)?;

        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingSubject)?
            .to_string();

        let expires_at_ms = claims
            .get("exp")
            .and_then(claim_seconds)
            .ok_or(ParseError::MissingExpiry)?
            .saturating_mul(1000);

        let issued_at_ms = claims
            .get("iat")
            .and_then(claim_seconds)
            .map(|s| s.saturating_mul(1000));

        let string_claim = |name: &str| {
            claims
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(Self {
            raw: raw.to_string(),
            subject,
            issued_at_ms,
            expires_at_ms,
            hashed_user_id: string_claim("huid"),
            hashed_group_id: string_claim("hgid"),
        })
    }

    /// The raw token string, for forwarding as a bearer credential
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `sub` claim
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `iat` claim in unix-epoch milliseconds, if present
    pub fn issued_at_ms(&self) -> Option<i64> {
        self.issued_at_ms
    }

    /// `exp` claim in unix-epoch milliseconds
    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at_ms
    }

    /// Hashed user id (`huid` claim), if present
    pub fn hashed_user_id(&self) -> Option<&str> {
        self.hashed_user_id.as_deref()
    }

    /// Hashed group id (`hgid` claim), if present
    pub fn hashed_group_id(&self) -> Option<&str> {
        self.hashed_group_id.as_deref()
    }

    /// Whether the token is expired at the given unix-epoch millisecond clock
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Whether the token is expired against the wall clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_unix_ms())
    }

    /// Time remaining until expiry at the given clock, floored at zero
    pub fn time_until_expiry_at(&self, now_ms: i64) -> Duration {
        Duration::from_millis((self.expires_at_ms - now_ms).max(0) as u64)
    }

    /// Time remaining until expiry against the wall clock, floored at zero
    pub fn time_until_expiry(&self) -> Duration {
        self.time_until_expiry_at(now_unix_ms())
    }
}

impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialToken")
            .field("subject", &self.subject)
            .field("expires_at_ms", &self.expires_at_ms)
            .field("raw", &"[REDACTED]")
            .finish()
    }
}

/// Current wall clock as unix-epoch milliseconds
pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Decode one base64url segment, tolerating issuers that pad
fn decode_segment(segment: &str) -> Result<Vec<u8>, ParseError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| ParseError::InvalidEncoding)
}

/// Numeric claim in seconds; strings are rejected
fn claim_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn token_with_claims(claims: serde_json::Value) -> String {
        let header = encode(&serde_json::json!({"alg": "HS256", "typ": "JWT"}));
        format!("{}.{}.c2lnbmF0dXJl", header, encode(&claims))
    }

    #[test]
    fn test_parse_valid_token() {
        let raw = token_with_claims(serde_json::json!({
            "sub": "user-1",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600,
            "huid": "h-user",
            "hgid": "h-group",
        }));

        let token = CredentialToken::parse(&raw).unwrap();
        assert_eq!(token.subject(), "user-1");
        assert_eq!(token.issued_at_ms(), Some(1_700_000_000_000));
        assert_eq!(token.expires_at_ms(), 1_700_003_600_000);
        assert_eq!(token.hashed_user_id(), Some("h-user"));
        assert_eq!(token.hashed_group_id(), Some("h-group"));
        assert_eq!(token.raw(), raw);
    }

    #[test]
    fn test_parse_wrong_segment_count() {
        assert_eq!(
            CredentialToken::parse("only.two"),
            Err(ParseError::MalformedStructure { segments: 2 })
        );
        assert_eq!(
            CredentialToken::parse("a.b.c.d"),
            Err(ParseError::MalformedStructure { segments: 4 })
        );
    }

    #[test]
    fn test_parse_invalid_encoding() {
        assert_eq!(
            CredentialToken::parse("aGVhZGVy.!!!not-base64!!!.c2ln"),
            Err(ParseError::InvalidEncoding)
        );
    }

    #[test]
    fn test_parse_claims_not_json() {
        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        let raw = format!("aGVhZGVy.{}.c2ln", not_json);
        assert_eq!(
            CredentialToken::parse(&raw),
            Err(ParseError::InvalidClaims)
        );
    }

    #[test]
    fn test_parse_missing_subject() {
        let raw = token_with_claims(serde_json::json!({"exp": 1_700_000_000}));
        assert_eq!(CredentialToken::parse(&raw), Err(ParseError::MissingSubject));
    }

    #[test]
    fn test_parse_missing_expiry() {
        let raw = token_with_claims(serde_json::json!({"sub": "user-1"}));
        assert_eq!(CredentialToken::parse(&raw), Err(ParseError::MissingExpiry));
    }

    #[test]
    fn test_parse_non_numeric_expiry() {
        let raw = token_with_claims(serde_json::json!({
            "sub": "user-1",
            "exp": "1700000000",
        }));
        assert_eq!(CredentialToken::parse(&raw), Err(ParseError::MissingExpiry));
    }

    #[test]
    fn test_parse_tolerates_padded_segment() {
        let claims = serde_json::to_vec(&serde_json::json!({
            "sub": "user-1",
            "exp": 1_700_000_000,
        }))
        .unwrap();
        let padded = base64::engine::general_purpose::URL_SAFE.encode(&claims);
        let raw = format!("aGVhZGVy.{}.c2ln", padded);

        let token = CredentialToken::parse(&raw).unwrap();
        assert_eq!(token.subject(), "user-1");
    }

    #[test]
    fn test_expiry_boundaries() {
        let raw = token_with_claims(serde_json::json!({
            "sub": "user-1",
            "exp": 1_000,
        }));
        let token = CredentialToken::parse(&raw).unwrap();

        assert!(!token.is_expired_at(999_999));
        assert!(token.is_expired_at(1_000_000));
        assert!(token.is_expired_at(1_000_001));
    }

    #[test]
    fn test_time_until_expiry_floors_at_zero() {
        let raw = token_with_claims(serde_json::json!({
            "sub": "user-1",
            "exp": 1_000,
        }));
        let token = CredentialToken::parse(&raw).unwrap();

        assert_eq!(
            token.time_until_expiry_at(400_000),
            Duration::from_millis(600_000)
        );
        assert_eq!(token.time_until_expiry_at(2_000_000), Duration::ZERO);
    }

    #[test]
    fn test_debug_redacts_raw() {
        let raw = token_with_claims(serde_json::json!({
            "sub": "user-1",
            "exp": 1_700_000_000,
        }));
        let token = CredentialToken::parse(&raw).unwrap();
        let debug = format!("{:?}", token);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&raw));
    }
}
