//! Destroy Session Use Case
//!
//! Invalidates the server-side session and expires the browser cookie.
//! Always produces the clearing cookie, even when the store delete fails:
//! logout must clear whatever half it still can.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::application::config::SessionConfig;
use crate::application::gateway::SessionCookieGateway;
use crate::domain::repository::SessionRepository;

/// Destroy session use case
pub struct DestroySessionUseCase<R>
where
    R: SessionRepository,
{
    repo: Arc<R>,
    config: Arc<SessionConfig>,
}

impl<R> DestroySessionUseCase<R>
where
    R: SessionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<SessionConfig>) -> Self {
        Self { repo, config }
    }

    /// Destroy the session named by the request cookie, if any.
    ///
    /// Returns the Set-Cookie value that expires the session cookie.
    pub async fn execute(&self, headers: &HeaderMap) -> String {
        let gateway = SessionCookieGateway::new(self.config.clone());

        if let Some(session_id) = gateway.read(headers) {
            match self.repo.delete(session_id).await {
                Ok(()) => {
                    tracing::info!(session_id = %session_id, "Session destroyed");
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Session delete failed; clearing cookie anyway"
                    );
                }
            }
        }

        gateway.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::establish_session::EstablishSessionUseCase;
    use crate::infra::memory::InMemorySessionStore;
    use axum::http::{HeaderValue, header};
    use chrono::Utc;

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

    #[tokio::test]
    async fn test_destroy_deletes_record_and_clears_cookie() {
        let store = Arc::new(InMemorySessionStore::new());
        let config = Arc::new(SessionConfig::with_random_secret());

        let established = EstablishSessionUseCase::new(store.clone(), config.clone())
            .execute(sample_token(), "user-1")
            .await
            .unwrap();

        let pair = established.set_cookie.split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());

        let clear = DestroySessionUseCase::new(store.clone(), config)
            .execute(&headers)
            .await;

        assert!(clear.contains("Max-Age=0"));
        assert!(store.get(established.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroy_without_cookie_still_clears() {
        let store = Arc::new(InMemorySessionStore::new());
        let config = Arc::new(SessionConfig::with_random_secret());

        let clear = DestroySessionUseCase::new(store, config)
            .execute(&HeaderMap::new())
            .await;

        assert!(clear.contains("Max-Age=0"));
    }
}
