//! API Handlers
//!
//! Login drives the auth flow against the demo collaborator and lands the
//! issued credential in the server session store; everything else is thin
//! plumbing over the session subsystem.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use kernel::error::app_error::AppError;
use kernel::token::CredentialToken;
use session::application::establish_session::{EstablishSessionUseCase, EstablishedSession};
use session::application::config::SessionConfig;
use session::infra::memory::InMemorySessionStore;
use session::presentation::dto::{LoginRequest, LoginResponse};
use session::presentation::middleware::CurrentSession;
use vault::{AuthFlow, AuthState, CredentialSink, VaultError, VaultResult};

use crate::login::DemoLoginService;

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    pub repo: Arc<InMemorySessionStore>,
    pub session_config: Arc<SessionConfig>,
    pub login: Arc<DemoLoginService>,
}

/// Proxy deployment mode: a fresh credential becomes a server session
pub struct ServerSessionSink {
    use_case: EstablishSessionUseCase<InMemorySessionStore>,
    established: Mutex<Option<EstablishedSession>>,
}

impl ServerSessionSink {
    pub fn new(repo: Arc<InMemorySessionStore>, config: Arc<SessionConfig>) -> Self {
        Self {
            use_case: EstablishSessionUseCase::new(repo, config),
            established: Mutex::new(None),
        }
    }

    /// Take the established session, if the flow reached `Authenticated`
    pub fn take(&self) -> Option<EstablishedSession> {
        self.established
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl CredentialSink for ServerSessionSink {
    async fn establish(&self, credential: &CredentialToken) -> VaultResult<()> {
        let owner = credential
            .hashed_user_id()
            .unwrap_or(credential.subject())
            .to_string();

        let established = self
            .use_case
            .execute(credential.clone(), &owner)
            .await
            .map_err(|e| VaultError::Internal(e.to_string()))?;

        *self
            .established
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(established);
        Ok(())
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, Response> {
    let sink = Arc::new(ServerSessionSink::new(
        state.repo.clone(),
        state.session_config.clone(),
    ));
    let mut flow = AuthFlow::new(state.login.clone(), sink.clone());

    let mut auth_state = flow
        .submit_credentials(&request.username, &request.password)
        .await
        .map_err(login_error)?;

    // One round trip carries both halves: a request that already has the
    // code completes the MFA step immediately
    if let Some(code) = request.mfa_code.as_deref() {
        auth_state = match auth_state {
            AuthState::MfaRequired => flow.submit_mfa_code(code).await.map_err(login_error)?,
            AuthState::MfaSetupRequired => flow
                .complete_mfa_enrollment(code)
                .await
                .map_err(login_error)?,
            other => other,
        };
    }

    match auth_state {
        AuthState::Authenticated => {
            let established = sink.take().ok_or_else(|| {
                AppError::internal("Session was not established").into_response()
            })?;

            Ok((
                [(header::SET_COOKIE, established.set_cookie)],
                Json(LoginResponse::authenticated(
                    established.anti_forgery_token,
                    established.expires_at_ms,
                )),
            )
                .into_response())
        }
        AuthState::MfaRequired => Ok(Json(LoginResponse::mfa_required()).into_response()),
        AuthState::MfaSetupRequired => {
            Ok(Json(LoginResponse::mfa_setup_required()).into_response())
        }
        AuthState::Unauthenticated => {
            Err(AppError::unauthorized("Invalid credentials").into_response())
        }
    }
}

fn login_error(e: VaultError) -> Response {
    e.to_app_error().into_response()
}

/// Refresh response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/auth/refresh - exchange a bearer credential for a fresh one
pub async fn refresh(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, Response> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("Missing bearer credential").into_response())?;

    let token = state
        .login
        .refresh_token(raw)
        .map_err(|e| e.to_app_error().into_response())?;

    Ok(Json(RefreshResponse {
        token: token.raw().to_string(),
    }))
}

/// GET /api/panel/overview - sample protected route
pub async fn overview(Extension(current): Extension<CurrentSession>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "subject": current.subject,
        "owner": current.owner_user_id,
        "sessionId": current.session_id.to_string(),
    }))
}

/// POST /api/panel/refresh-data - sample state-changing protected route;
/// passes only with a valid `X-CSRF-Token`
pub async fn refresh_data(
    Extension(current): Extension<CurrentSession>,
) -> Json<serde_json::Value> {
    tracing::info!(session_id = %current.session_id, "Panel data refresh requested");
    Json(serde_json::json!({ "accepted": true }))
}
