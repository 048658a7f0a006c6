//! Collaborator Traits
//!
//! Interfaces to storage and to the out-of-scope login/refresh services.
//! Implementations live in the infrastructure layer or in the embedding
//! application.

use kernel::token::CredentialToken;

use crate::domain::value_object::login_outcome::LoginOutcome;
use crate::error::VaultResult;

/// Transient key-value storage backing the credential cache.
///
/// Tab-scoped in a browser deployment; process-scoped here. All operations
/// are expected to complete in memory and return promptly.
pub trait CredentialStorage: Send + Sync {
    fn get(&self, key: &str) -> VaultResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> VaultResult<()>;
    fn remove(&self, key: &str) -> VaultResult<()>;
}

/// Exchanges the current credential for a fresh one
#[trait_variant::make(TokenRefresher: Send)]
pub trait LocalTokenRefresher {
    async fn refresh(&self, current: &CredentialToken) -> VaultResult<CredentialToken>;
}

/// External login collaborator.
///
/// Bounded retry counting for wrong MFA codes is this collaborator's job,
/// not the state machine's.
#[trait_variant::make(LoginService: Send)]
pub trait LocalLoginService {
    async fn login(
        &self,
        username: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> VaultResult<LoginOutcome>;
}

/// Takes ownership of a freshly issued credential.
///
/// The server session store in proxy deployments, the credential cache in
/// client-cache deployments.
#[trait_variant::make(CredentialSink: Send)]
pub trait LocalCredentialSink {
    async fn establish(&self, credential: &CredentialToken) -> VaultResult<()>;
}

/// Collaborators invoked on forced logout.
///
/// Each hook is best-effort and independent: failure of one half must not
/// prevent clearing the other.
pub trait LogoutHooks: Send + Sync {
    /// Expire the browser session cookie, if any
    fn clear_session_cookie(&self);

    /// Best-effort invalidation of the server-side session
    fn invalidate_server_session(&self);

    /// Navigate the UI to the unauthenticated entry point
    fn navigate_to_entry(&self);
}

/// Hooks for deployments without a server half
#[derive(Debug, Clone, Default)]
pub struct NoopLogoutHooks;

impl LogoutHooks for NoopLogoutHooks {
    fn clear_session_cookie(&self) {}
    fn invalidate_server_session(&self) {}
    fn navigate_to_entry(&self) {}
}
