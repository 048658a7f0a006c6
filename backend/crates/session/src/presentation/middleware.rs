//! Session Middleware
//!
//! Middleware requiring a valid session on protected routes, with
//! anti-forgery enforcement on state-changing methods.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::id::SessionId;
use platform::device::extract_client_ip;
use platform::monitor::SecurityEventMonitor;

use crate::application::check_session::CheckSessionUseCase;
use crate::application::config::SessionConfig;
use crate::domain::repository::SessionRepository;
use crate::error::SessionError;

/// Header the client echoes the anti-forgery token in
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Middleware state
pub struct SessionMiddlewareState<R>
where
    R: SessionRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<SessionConfig>,
    pub monitor: SecurityEventMonitor,
}

impl<R> Clone for SessionMiddlewareState<R>
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

/// Session info stored in request extensions for downstream handlers
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: SessionId,
    pub owner_user_id: String,
    pub subject: String,
}

/// Middleware that requires a valid session.
///
/// On state-changing methods the `X-CSRF-Token` header must also match the
/// session's anti-forgery token; a missing header is validated as an empty
/// token and fails the same way.
pub async fn require_session<R>(
    state: SessionMiddlewareState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: SessionRepository + Send + Sync + 'static,
{
    let headers = req.headers();

    let use_case = CheckSessionUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.monitor.clone(),
    );

    let record = match use_case.session_for_headers(headers).await {
        Ok(record) => record,
        Err(_) => {
            return Err(
                (StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response()
            );
        }
    };

    if is_state_changing(req.method()) {
        let supplied = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let client_ip = req
            .extensions()
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|info| info.0.ip());
        let client_ip = extract_client_ip(headers, client_ip);

        let valid = use_case
            .validate_anti_forgery(record.session_id, &supplied, client_ip)
            .await
            .unwrap_or(false);

        if !valid {
            return Err(SessionError::AntiForgeryMismatch.into_response());
        }
    }

    req.extensions_mut().insert(CurrentSession {
        session_id: record.session_id,
        owner_user_id: record.owner_user_id,
        subject: record.credential.subject().to_string(),
    });

    Ok(next.run(req).await)
}

fn is_state_changing(method: &Method) -> bool {
    *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH
        || *method == Method::DELETE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_changing_methods() {
        assert!(is_state_changing(&Method::POST));
        assert!(is_state_changing(&Method::PUT));
        assert!(is_state_changing(&Method::PATCH));
        assert!(is_state_changing(&Method::DELETE));
        assert!(!is_state_changing(&Method::GET));
        assert!(!is_state_changing(&Method::HEAD));
        assert!(!is_state_changing(&Method::OPTIONS));
    }
}
