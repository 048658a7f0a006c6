//! Check Session Use Case
//!
//! Verifies the session cookie, retrieves the live record, and validates
//! anti-forgery tokens on state-changing requests.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use kernel::id::SessionId;
use platform::monitor::{EventKind, SecurityEvent, SecurityEventMonitor, Severity};

use crate::application::config::SessionConfig;
use crate::application::gateway::SessionCookieGateway;
use crate::domain::entity::session_record::SessionRecord;
use crate::domain::repository::SessionRepository;
use crate::error::{SessionError, SessionResult};

/// Check session use case
pub struct CheckSessionUseCase<R>
where
    R: SessionRepository,
{
    repo: Arc<R>,
    config: Arc<SessionConfig>,
    monitor: SecurityEventMonitor,
}

impl<R> CheckSessionUseCase<R>
where
    R: SessionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>, monitor: SecurityEventMonitor) -> Self {
        Self {
            repo,
            config,
            monitor,
        }
    }

    /// Resolve the live session named by the request cookie.
    ///
    /// A missing cookie, a bad signature, an unknown id, and an expired
    /// record all surface as the same `SessionInvalid`; callers never
    /// distinguish the causes.
    pub async fn session_for_headers(&self, headers: &HeaderMap) -> SessionResult<SessionRecord> {
        let gateway = SessionCookieGateway::new(self.config.clone());
        let session_id = gateway.read(headers).ok_or(SessionError::SessionInvalid)?;

        self.repo
            .get(session_id)
            .await?
            .ok_or(SessionError::SessionInvalid)
    }

    /// Just check whether the request carries a valid session
    pub async fn is_valid(&self, headers: &HeaderMap) -> bool {
        self.session_for_headers(headers).await.is_ok()
    }

    /// Validate a supplied anti-forgery token against the stored one.
    ///
    /// Constant-time comparison. A mismatch is reported to the security
    /// monitor as a suspicious request but does not delete the session;
    /// only a mismatched credential forces teardown.
    pub async fn validate_anti_forgery(
        &self,
        session_id: SessionId,
        supplied: &str,
        client_ip: Option<IpAddr>,
    ) -> SessionResult<bool> {
        let record = self
            .repo
            .get(session_id)
            .await?
            .ok_or(SessionError::SessionInvalid)?;

        let matches = platform::crypto::constant_time_eq(
            record.anti_forgery_token.as_bytes(),
            supplied.as_bytes(),
        );

        if !matches {
            let mut event = SecurityEvent::new(EventKind::SuspiciousRequest, Severity::Medium)
                .with_detail("reason", "anti-forgery token mismatch")
                .with_detail("session_id", session_id.to_string());
            if let Some(ip) = client_ip {
                event = event.with_detail("client_ip", ip.to_string());
            }
            self.monitor.log(event);
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::establish_session::EstablishSessionUseCase;
    use crate::infra::memory::InMemorySessionStore;
    use axum::http::{HeaderValue, header};
    use chrono::Utc;
    use platform::monitor::MonitorConfig;

    fn sample_token() -> kernel::token::CredentialToken {
        let claims = serde_json::json!({
            "sub": "user-1",
            "exp": Utc::now().timestamp() + 600,
        });
        let raw = format!(
            "{}.{}.{}",
            platform::crypto::to_base64url(br#"{"alg":"HS256","typ":"JWT"}"#),
            platform::crypto::to_base64url(&serde_json::to_vec(&claims).unwrap()),
            platform::crypto::to_base64url(b"sig"),
        );
        kernel::token::CredentialToken::parse(&raw).unwrap()
    }

    struct Fixture {
        store: Arc<InMemorySessionStore>,
        config: Arc<SessionConfig>,
        monitor: SecurityEventMonitor,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(InMemorySessionStore::new()),
                config: Arc::new(SessionConfig::with_random_secret()),
                monitor: SecurityEventMonitor::new(MonitorConfig::default()),
            }
        }

        fn check(&self) -> CheckSessionUseCase<InMemorySessionStore> {
            CheckSessionUseCase::new(
                self.store.clone(),
                self.config.clone(),
                self.monitor.clone(),
            )
        }

        async fn establish(&self) -> crate::application::establish_session::EstablishedSession {
            EstablishSessionUseCase::new(self.store.clone(), self.config.clone())
                .execute(sample_token(), "user-1")
                .await
                .unwrap()
        }
    }

    fn headers_from_set_cookie(set_cookie: &str) -> HeaderMap {
        // Turn "name=value; HttpOnly; ..." into a request Cookie header
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_session() {
        let fixture = Fixture::new();
        let established = fixture.establish().await;

        let headers = headers_from_set_cookie(&established.set_cookie);
        let record = fixture.check().session_for_headers(&headers).await.unwrap();

        assert_eq!(record.session_id, established.session_id);
        assert!(fixture.check().is_valid(&headers).await);
    }

    #[tokio::test]
    async fn test_missing_cookie_is_session_invalid() {
        let fixture = Fixture::new();
        let result = fixture
            .check()
            .session_for_headers(&HeaderMap::new())
            .await;
        assert!(matches!(result, Err(SessionError::SessionInvalid)));
    }

    #[tokio::test]
    async fn test_anti_forgery_match() {
        let fixture = Fixture::new();
        let established = fixture.establish().await;

        let ok = fixture
            .check()
            .validate_anti_forgery(
                established.session_id,
                &established.anti_forgery_token,
                None,
            )
            .await
            .unwrap();

        assert!(ok);
        assert!(fixture.monitor.is_empty());
    }

    #[tokio::test]
    async fn test_anti_forgery_mismatch_reports_but_keeps_session() {
        let fixture = Fixture::new();
        let established = fixture.establish().await;

        let ok = fixture
            .check()
            .validate_anti_forgery(established.session_id, "forged-token", None)
            .await
            .unwrap();

        assert!(!ok);

        // Reported as a medium-severity suspicious request
        let events = fixture.monitor.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::SuspiciousRequest);
        assert_eq!(events[0].severity, Severity::Medium);

        // The session itself survives; only mismatched credentials tear down
        assert!(
            fixture
                .store
                .get(established.session_id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
