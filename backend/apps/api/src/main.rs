//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors go through
//! the unified `kernel::error::AppError` system.

mod handlers;
mod login;

use axum::{
    Router, http,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use platform::monitor::{MonitorConfig, SecurityEventMonitor};
use session::application::config::SessionConfig;
use session::infra::memory::InMemorySessionStore;
use session::presentation::middleware::{SessionMiddlewareState, require_session};
use session::presentation::router::session_router;

use crate::handlers::ApiState;
use crate::login::DemoLoginService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,session=info,vault=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Session configuration
    let session_config = if cfg!(debug_assertions) {
        Arc::new(SessionConfig::development())
    } else {
        // In production, load the signing secret from the environment
        Arc::new(SessionConfig {
            session_secret: secret_from_env("SESSION_SECRET")?,
            ..SessionConfig::default()
        })
    };

    // Credential token secret for the demo login collaborator
    let token_secret = if cfg!(debug_assertions) {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        secret
    } else {
        secret_from_env("TOKEN_SECRET")?
    };

    // Security event monitor with its background age sweep
    let monitor = SecurityEventMonitor::new(MonitorConfig::default());
    let _monitor_sweeper = monitor.spawn_sweeper();

    // Session store with its background expired-session sweep
    let store = Arc::new(InMemorySessionStore::new());
    let _session_sweeper = store.spawn_sweeper(session_config.sweep_interval);

    let login_service = Arc::new(DemoLoginService::from_env(token_secret)?);

    let api_state = ApiState {
        repo: store.clone(),
        session_config: session_config.clone(),
        login: login_service,
    };

    // Auth surface: login/refresh plus the session status/logout routes
    let auth_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .with_state(api_state)
        .merge(session_router(
            store.clone(),
            session_config.clone(),
            monitor.clone(),
        ));

    // Protected surface behind session + anti-forgery middleware
    let middleware_state = SessionMiddlewareState {
        repo: store.clone(),
        config: session_config.clone(),
        monitor: monitor.clone(),
    };
    let panel_routes = Router::new()
        .route("/overview", get(handlers::overview))
        .route("/refresh-data", post(handlers::refresh_data))
        .layer(middleware::from_fn(move |req, next| {
            require_session(middleware_state.clone(), req, next)
        }));

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40811,http://127.0.0.1:40811".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(
                session::presentation::middleware::CSRF_HEADER,
            ),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/panel", panel_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31184));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Decode a 32-byte base64 secret from the environment
fn secret_from_env(name: &str) -> anyhow::Result<[u8; 32]> {
    let encoded =
        env::var(name).map_err(|_| anyhow::anyhow!("{name} must be set in production"))?;
    let bytes = general_purpose::STANDARD.decode(&encoded)?;

    if bytes.len() != 32 {
        anyhow::bail!("{name} must decode to exactly 32 bytes");
    }

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&bytes);
    Ok(secret)
}
