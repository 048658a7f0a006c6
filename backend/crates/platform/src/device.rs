//! Device identification utilities
//!
//! A device fingerprint summarizes stable characteristics of the running
//! environment. Cached credentials are bound to the fingerprint captured at
//! store time; a mismatch at read time means the material moved to another
//! device and must not be honored.

use axum::http::HeaderMap;
use std::net::IpAddr;

use crate::crypto::{sha256, to_base64url};

/// Source of the current device fingerprint.
///
/// Injected rather than read ambiently so tests can simulate a credential
/// copied between devices.
pub trait FingerprintProvider: Send + Sync {
    /// The fingerprint of the device this process is running on
    fn current(&self) -> String;
}

/// Fingerprint derived from stable host characteristics
///
/// Digest over OS, architecture and hostname. Coarse on purpose: the value
/// must survive process restarts on the same machine.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentFingerprint;

impl FingerprintProvider for EnvironmentFingerprint {
    fn current(&self) -> String {
        let hostname = std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .unwrap_or_else(|_| "unknown-host".to_string());

        let material = format!(
            "{}|{}|{}|{}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            std::env::consts::FAMILY,
            hostname
        );

        to_base64url(&sha256(material.as_bytes()))
    }
}

/// Fixed fingerprint, for tests and for deployments that provision one
#[derive(Debug, Clone)]
pub struct StaticFingerprint(pub String);

impl FingerprintProvider for StaticFingerprint {
    fn current(&self) -> String {
        self.0.clone()
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}
