//! Vault (Client-Side Credential Cache) Module
//!
//! Clean Architecture structure:
//! - `domain/` - Cached credential envelope, auth states, collaborator traits
//! - `application/` - Cache, refresh scheduler, login flow, configuration
//! - `infra/` - Transient storage and HTTP refresh implementations
//!
//! ## Security Model
//! - Credentials at rest are obfuscated with a keyed XOR keystream: a
//!   defense against casual inspection, not strong confidentiality. An
//!   encryption failure is an error, never a plaintext fallback
//! - Cached material is bound to the device fingerprint captured at store
//!   time; a mismatch at read time clears the cache and forces logout
//! - Storage age is bounded independently of the token's own expiry; both
//!   are re-checked on every read
//! - A failed refresh is not recovered locally: the cache is cleared, the
//!   session cookie expired, and the UI sent to the unauthenticated entry

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::cache::CredentialCache;
pub use application::config::VaultConfig;
pub use application::escalation::ForcedLogoutEscalation;
pub use application::login_flow::AuthFlow;
pub use application::refresh::{CancellableHandle, RefreshScheduler};
pub use domain::repository::{
    CredentialSink, CredentialStorage, LoginService, LogoutHooks, NoopLogoutHooks, TokenRefresher,
};
pub use domain::value_object::auth_state::AuthState;
pub use domain::value_object::login_outcome::LoginOutcome;
pub use error::{VaultError, VaultResult};
pub use infra::memory::TransientStorage;
