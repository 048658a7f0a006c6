//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, Base64, keystream obfuscation)
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Device fingerprinting
//! - Security event monitoring

pub mod cookie;
pub mod crypto;
pub mod device;
pub mod monitor;
pub mod password;
