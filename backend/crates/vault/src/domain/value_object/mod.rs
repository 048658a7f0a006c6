//! Domain Value Objects

pub mod auth_state;
pub mod login_outcome;
