//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod destroy_session;
pub mod establish_session;
pub mod gateway;

// Re-exports
pub use check_session::CheckSessionUseCase;
pub use config::SessionConfig;
pub use destroy_session::DestroySessionUseCase;
pub use establish_session::{EstablishSessionUseCase, EstablishedSession};
pub use gateway::SessionCookieGateway;
