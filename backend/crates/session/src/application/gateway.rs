//! Session Cookie Gateway
//!
//! Issues and reads the opaque session identifier via a signed cookie.
//! The cookie value is `<session id>.<base64url HMAC-SHA256 signature>`;
//! forged or tampered values fail verification before any store lookup.
//! The raw credential never crosses into the cookie.

use std::sync::Arc;

use axum::http::HeaderMap;
use base64::Engine;
use hmac::{Hmac, Mac};
use kernel::id::SessionId;
use sha2::Sha256;

use crate::application::config::SessionConfig;

/// Gateway between the session store and the browser cookie
#[derive(Clone)]
pub struct SessionCookieGateway {
    config: Arc<SessionConfig>,
}

impl SessionCookieGateway {
    pub fn new(config: Arc<SessionConfig>) -> Self {
        Self { config }
    }

    /// Build the Set-Cookie value carrying the signed session id
    pub fn issue(&self, session_id: SessionId) -> String {
        self.config.cookie.build_set_cookie(&self.sign(session_id))
    }

    /// Read the session id from request headers.
    ///
    /// Absent, malformed, or badly-signed cookies yield `None`; an
    /// unauthenticated visitor is a normal case, not an error.
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionId> {
        let value = platform::cookie::extract_cookie(headers, &self.config.cookie.name)?;
        self.verify(&value)
    }

    /// Build the Set-Cookie value that removes the session cookie
    pub fn clear(&self) -> String {
        self.config.cookie.build_delete_cookie()
    }

    /// Sign a session id into a cookie value
    fn sign(&self, session_id: SessionId) -> String {
        let session_id = session_id.to_string();

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(session_id.as_bytes());
        let signature = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            session_id,
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Verify a cookie value and extract the session id
    fn verify(&self, value: &str) -> Option<SessionId> {
        let (session_id_str, signature_b64) = value.split_once('.')?;

        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .ok()?;

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(session_id_str.as_bytes());
        mac.verify_slice(&signature).ok()?;

        SessionId::parse(session_id_str).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};

    fn gateway() -> SessionCookieGateway {
        SessionCookieGateway::new(Arc::new(SessionConfig::with_random_secret()))
    }

    fn headers_with_cookie(gateway: &SessionCookieGateway, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = format!("{}={}", gateway.config.cookie.name, value);
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        headers
    }

    #[test]
    fn test_issue_read_roundtrip() {
        let gateway = gateway();
        let session_id = SessionId::new();

        let signed = gateway.sign(session_id);
        let headers = headers_with_cookie(&gateway, &signed);

        assert_eq!(gateway.read(&headers), Some(session_id));
    }

    #[test]
    fn test_read_rejects_tampered_signature() {
        let gateway = gateway();
        let session_id = SessionId::new();

        let mut signed = gateway.sign(session_id);
        signed.pop();
        signed.push('A');

        let headers = headers_with_cookie(&gateway, &signed);
        assert_eq!(gateway.read(&headers), None);
    }

    #[test]
    fn test_read_rejects_wrong_secret() {
        let issuing = gateway();
        let verifying = gateway(); // different random secret
        let signed = issuing.sign(SessionId::new());

        let headers = headers_with_cookie(&verifying, &signed);
        assert_eq!(verifying.read(&headers), None);
    }

    #[test]
    fn test_read_tolerates_absent_or_malformed_cookie() {
        let gateway = gateway();

        assert_eq!(gateway.read(&HeaderMap::new()), None);

        let headers = headers_with_cookie(&gateway, "not-a-signed-value");
        assert_eq!(gateway.read(&headers), None);

        let headers = headers_with_cookie(&gateway, "garbage.!!!");
        assert_eq!(gateway.read(&headers), None);
    }

    #[test]
    fn test_issue_sets_cookie_attributes() {
        let gateway = gateway();
        let cookie = gateway.issue(SessionId::new());

        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[test]
    fn test_clear_expires_cookie() {
        let gateway = gateway();
        assert!(gateway.clear().contains("Max-Age=0"));
    }
}
