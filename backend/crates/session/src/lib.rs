//! Session (Server-Side Credential Session) Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session record entity, repository trait
//! - `application/` - Use cases, cookie gateway, configuration
//! - `infra/` - In-memory store implementation
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Security Model
//! - The browser only ever holds an opaque session id in an HttpOnly,
//!   SameSite=Strict cookie; the credential token never leaves the store
//! - Cookie values are HMAC-signed so forged ids fail before any lookup
//! - Expired records are removed both lazily (on `get`) and by a periodic
//!   sweep, so idle sessions cannot accumulate
//! - Anti-forgery tokens are compared in constant time; mismatches are
//!   reported to the security monitor but do not tear the session down

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::SessionConfig;
pub use application::gateway::SessionCookieGateway;
pub use error::{SessionError, SessionResult};
pub use infra::memory::InMemorySessionStore;
pub use presentation::router::session_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
