//! Session Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use platform::monitor::SecurityEventMonitor;

use crate::application::config::SessionConfig;
use crate::domain::repository::SessionRepository;
use crate::presentation::handlers::{self, SessionAppState};

/// Create the session router for any repository implementation
pub fn session_router<R>(
    repo: Arc<R>,
    config: Arc<SessionConfig>,
    monitor: SecurityEventMonitor,
) -> Router
where
    R: SessionRepository + Send + Sync + 'static,
{
    let state = SessionAppState {
        repo,
        config,
        monitor,
    };

    Router::new()
        .route("/status", get(handlers::session_status::<R>))
        .route("/logout", post(handlers::sign_out::<R>))
        .with_state(state)
}
