//! Auth Login Flow
//!
//! Drives login through its states using outcomes from the external login
//! collaborator. On success the issued credential flows into the injected
//! `CredentialSink`: the server session store in proxy deployments, the
//! credential cache in client-cache deployments.

use std::sync::Arc;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::repository::{CredentialSink, LoginService};
use crate::domain::value_object::auth_state::AuthState;
use crate::domain::value_object::login_outcome::LoginOutcome;
use crate::error::{VaultError, VaultResult};

/// Credentials held between the first submission and MFA completion
#[derive(Zeroize, ZeroizeOnDrop)]
struct PendingLogin {
    username: String,
    password: String,
}

/// Login state machine
pub struct AuthFlow<L, S>
where
    L: LoginService,
    S: CredentialSink,
{
    login_service: Arc<L>,
    sink: Arc<S>,
    state: AuthState,
    pending: Option<PendingLogin>,
}

impl<L, S> AuthFlow<L, S>
where
    L: LoginService,
    S: CredentialSink,
{
    pub fn new(login_service: Arc<L>, sink: Arc<S>) -> Self {
        Self {
            login_service,
            sink,
            state: AuthState::Unauthenticated,
            pending: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Submit username and password.
    ///
    /// Rejected credentials leave the state unchanged and propagate as
    /// `LoginRejected`. Accepted credentials transition per the outcome;
    /// MFA outcomes hold the credentials for the completing call.
    pub async fn submit_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> VaultResult<AuthState> {
        let outcome = self.login_service.login(username, password, None).await?;

        match outcome {
            LoginOutcome::Authenticated(token) => {
                self.transition(AuthState::Authenticated)?;
                self.pending = None;
                self.sink.establish(&token).await?;
            }
            LoginOutcome::MfaRequired => {
                self.transition(AuthState::MfaRequired)?;
                self.pending = Some(PendingLogin {
                    username: username.to_string(),
                    password: password.to_string(),
                });
            }
            LoginOutcome::MfaSetupRequired => {
                self.transition(AuthState::MfaSetupRequired)?;
                self.pending = Some(PendingLogin {
                    username: username.to_string(),
                    password: password.to_string(),
                });
            }
        }

        Ok(self.state)
    }

    /// Submit the MFA code for an enrolled account.
    ///
    /// A wrong code propagates as `MfaRejected` with the state still
    /// `MfaRequired` (the self-loop); bounding retries is the
    /// collaborator's job, not this machine's.
    pub async fn submit_mfa_code(&mut self, code: &str) -> VaultResult<AuthState> {
        if self.state != AuthState::MfaRequired {
            return Err(self.invalid(AuthState::Authenticated));
        }

        let outcome = self.login_with_pending(code).await?;

        match outcome {
            LoginOutcome::Authenticated(token) => {
                self.transition(AuthState::Authenticated)?;
                self.pending = None;
                self.sink.establish(&token).await?;
            }
            _ => return Err(VaultError::MfaRejected),
        }

        Ok(self.state)
    }

    /// Complete MFA enrollment with the code confirming the new secret
    pub async fn complete_mfa_enrollment(&mut self, code: &str) -> VaultResult<AuthState> {
        if self.state != AuthState::MfaSetupRequired {
            return Err(self.invalid(AuthState::Authenticated));
        }

        let outcome = self.login_with_pending(code).await?;

        match outcome {
            LoginOutcome::Authenticated(token) => {
                self.transition(AuthState::Authenticated)?;
                self.pending = None;
                self.sink.establish(&token).await?;
            }
            _ => return Err(VaultError::MfaRejected),
        }

        Ok(self.state)
    }

    /// Return to `Unauthenticated`, valid from every state.
    ///
    /// Tearing down the stores is the caller's job; this only resets the
    /// flow and drops held credentials.
    pub fn logout(&mut self) -> AuthState {
        if self.state != AuthState::Unauthenticated {
            tracing::info!(from = %self.state, "Login flow reset");
        }
        self.pending = None;
        self.state = AuthState::Unauthenticated;
        self.state
    }

    async fn login_with_pending(&self, code: &str) -> VaultResult<LoginOutcome> {
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| VaultError::Internal("No pending login for MFA completion".into()))?;

        self.login_service
            .login(&pending.username, &pending.password, Some(code))
            .await
    }

    fn transition(&mut self, to: AuthState) -> VaultResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(self.invalid(to));
        }
        tracing::debug!(from = %self.state, to = %to, "Auth state transition");
        self.state = to;
        Ok(())
    }

    fn invalid(&self, to: AuthState) -> VaultError {
        tracing::error!(from = %self.state, to = %to, "Invalid auth state transition");
        VaultError::InvalidTransition {
            from: self.state,
            to,
        }
    }
}
