//! Domain Entities

pub mod cached_credential;
