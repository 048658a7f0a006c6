//! Establish Session Use Case
//!
//! Creates a server-side session for an authenticated credential and
//! prepares the signed cookie handed to the browser.

use std::sync::Arc;

use kernel::id::SessionId;
use kernel::token::CredentialToken;

use crate::application::config::SessionConfig;
use crate::application::gateway::SessionCookieGateway;
use crate::domain::entity::session_record::SessionRecord;
use crate::domain::repository::SessionRepository;
use crate::error::SessionResult;

/// Result of establishing a session
pub struct EstablishedSession {
    /// Opaque session id
    pub session_id: SessionId,
    /// Anti-forgery token the client must echo in `X-CSRF-Token`
    pub anti_forgery_token: String,
    /// Set-Cookie header value for the response
    pub set_cookie: String,
    /// Session expiry (Unix timestamp ms)
    pub expires_at_ms: i64,
}

/// Establish session use case
pub struct EstablishSessionUseCase<R>
where
    R: SessionRepository,
{
    repo: Arc<R>,
    config: Arc<SessionConfig>,
}

impl<R> EstablishSessionUseCase<R>
where
    R: SessionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        credential: CredentialToken,
        owner_user_id: &str,
    ) -> SessionResult<EstablishedSession> {
        let anti_forgery_token =
            platform::crypto::to_base64url(&platform::crypto::random_bytes(32));

        let record = SessionRecord::new(
            credential,
            owner_user_id,
            anti_forgery_token.clone(),
            self.config.session_lifetime,
        );

        self.repo.create(&record).await?;

        let gateway = SessionCookieGateway::new(self.config.clone());
        let set_cookie = gateway.issue(record.session_id);

        tracing::info!(
            session_id = %record.session_id,
            owner = %record.owner_user_id,
            "Session established"
        );

        Ok(EstablishedSession {
            session_id: record.session_id,
            anti_forgery_token,
            set_cookie,
            expires_at_ms: record.expires_at_ms,
        })
    }
}
