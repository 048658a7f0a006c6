//! Session HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use platform::monitor::SecurityEventMonitor;

use crate::application::check_session::CheckSessionUseCase;
use crate::application::config::SessionConfig;
use crate::application::destroy_session::DestroySessionUseCase;
use crate::domain::repository::SessionRepository;
use crate::presentation::dto::{LogoutResponse, SessionStatusResponse};

/// Shared handler state
pub struct SessionAppState<R>
where
    R: SessionRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<SessionConfig>,
    pub monitor: SecurityEventMonitor,
}

impl<R> Clone for SessionAppState<R>
where
    R: SessionRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            monitor: self.monitor.clone(),
        }
    }
}

/// GET /status - report whether the request carries a valid session
pub async fn session_status<R>(
    State(state): State<SessionAppState<R>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    R: SessionRepository + Send + Sync + 'static,
{
    let use_case = CheckSessionUseCase::new(state.repo, state.config, state.monitor);

    match use_case.session_for_headers(&headers).await {
        Ok(record) => Json(SessionStatusResponse {
            authenticated: true,
            subject: Some(record.credential.subject().to_string()),
            expires_at_ms: Some(record.expires_at_ms),
        }),
        // An unauthenticated visitor is a normal case, not an error
        Err(_) => Json(SessionStatusResponse {
            authenticated: false,
            subject: None,
            expires_at_ms: None,
        }),
    }
}

/// POST /logout - destroy the session and expire the cookie
pub async fn sign_out<R>(
    State(state): State<SessionAppState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: SessionRepository + Send + Sync + 'static,
{
    let use_case = DestroySessionUseCase::new(state.repo, state.config);
    let clear_cookie = use_case.execute(&headers).await;

    (
        [(header::SET_COOKIE, clear_cookie)],
        Json(LogoutResponse { signed_out: true }),
    )
        .into_response()
}
