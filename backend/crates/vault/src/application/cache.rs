//! Credential Cache
//!
//! Holds the credential at rest for deployments where it must temporarily
//! live outside the server session store. The token is obfuscated with a
//! keyed XOR keystream and bound to the device fingerprint captured at
//! store time. Storage age is bounded independently of the token's own
//! expiry. Every one of those invariants is re-checked on every read.
//!
//! `load` never distinguishes its failure causes to callers: all of them
//! are "no credential". The distinction lives in the security events only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use kernel::token::CredentialToken;
use platform::device::FingerprintProvider;
use platform::monitor::{EventKind, SecurityEvent, SecurityEventMonitor, Severity};
use zeroize::Zeroize;

use crate::application::config::VaultConfig;
use crate::domain::entity::cached_credential::CachedCredential;
use crate::domain::repository::CredentialStorage;
use crate::error::{VaultError, VaultResult};

/// Client-side credential cache
pub struct CredentialCache {
    storage: Arc<dyn CredentialStorage>,
    fingerprint: Arc<dyn FingerprintProvider>,
    monitor: SecurityEventMonitor,
    config: Arc<VaultConfig>,
    migrated: AtomicBool,
}

impl CredentialCache {
    pub fn new(
        storage: Arc<dyn CredentialStorage>,
        fingerprint: Arc<dyn FingerprintProvider>,
        monitor: SecurityEventMonitor,
        config: Arc<VaultConfig>,
    ) -> Self {
        Self {
            storage,
            fingerprint,
            monitor,
            config,
            migrated: AtomicBool::new(false),
        }
    }

    /// Store a credential, obfuscated and bound to the current device.
    ///
    /// Any failure is an error; there is no plaintext fallback.
    pub fn store(&self, token: &CredentialToken) -> VaultResult<()> {
        let ciphertext =
            platform::crypto::keystream_xor(&self.config.obfuscation_secret, token.raw().as_bytes());

        let envelope = CachedCredential {
            ciphertext_b64: platform::crypto::to_base64(&ciphertext),
            fingerprint: self.fingerprint.current(),
            stored_at_ms: Utc::now().timestamp_millis(),
        };

        let json =
            serde_json::to_string(&envelope).map_err(|e| VaultError::Storage(e.to_string()))?;

        self.storage.put(&self.config.storage_key, &json)
    }

    /// Load the cached credential, if one survives validation.
    ///
    /// Validation order: fingerprint binding, storage age, token expiry.
    /// Every failure clears the cache; a fingerprint mismatch additionally
    /// forces logout through the monitor escalation.
    pub fn load(&self) -> Option<CredentialToken> {
        self.load_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn load_at(&self, now_ms: i64) -> Option<CredentialToken> {
        let json = match self.storage.get(&self.config.storage_key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Credential storage read failed");
                return None;
            }
        };

        let envelope: CachedCredential = match serde_json::from_str(&json) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Corrupted at rest; fail secure
                tracing::warn!(error = %e, "Cached credential envelope corrupted; clearing");
                self.clear();
                return None;
            }
        };

        let mut raw = match self.decrypt(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Cached credential decryption failed; clearing");
                self.clear();
                return None;
            }
        };

        // (1) Fingerprint binding
        if envelope.fingerprint != self.fingerprint.current() {
            raw.zeroize();
            self.monitor.log(
                SecurityEvent::new(EventKind::FingerprintMismatch, Severity::Critical)
                    .with_detail("reason", "cached credential bound to another device"),
            );
            self.clear();
            return None;
        }

        // (2) Storage age, independent of the token's own expiry
        if envelope.exceeds_max_age(now_ms, self.config.max_cache_age_ms()) {
            raw.zeroize();
            self.monitor.log(
                SecurityEvent::new(EventKind::TokenExpiry, Severity::Medium)
                    .with_detail("reason", "cached credential exceeded max age"),
            );
            self.clear();
            return None;
        }

        // (3) The token's own expiry; an unparsable token is expired
        let token = match CredentialToken::parse(&raw) {
            Ok(token) => token,
            Err(e) => {
                raw.zeroize();
                self.monitor.log(
                    SecurityEvent::new(EventKind::TokenExpiry, Severity::Medium)
                        .with_detail("reason", format!("cached credential unparsable: {e}")),
                );
                self.clear();
                return None;
            }
        };
        if token.is_expired_at(now_ms) {
            self.monitor.log(
                SecurityEvent::new(EventKind::TokenExpiry, Severity::Medium)
                    .with_detail("reason", "cached credential expired"),
            );
            self.clear();
            return None;
        }

        // A burst of reads in a short window is itself a signal; the
        // monitor counts these
        self.monitor
            .log(SecurityEvent::new(EventKind::TokenAccess, Severity::Low));

        Some(token)
    }

    /// Remove the cached credential and any legacy slot
    pub fn clear(&self) {
        // Both removals run; one failing must not mask the other
        if let Err(e) = self.storage.remove(&self.config.storage_key) {
            tracing::warn!(error = %e, "Failed to clear credential slot");
        }
        if let Err(e) = self.storage.remove(&self.config.legacy_storage_key) {
            tracing::warn!(error = %e, "Failed to clear legacy credential slot");
        }
    }

    /// One-time migration of a legacy plaintext credential.
    ///
    /// A non-expired legacy token is re-stored through the encrypted path;
    /// an expired one is discarded. Idempotent: the guard flag and the
    /// removal of the legacy slot make a second run a no-op.
    pub fn migrate_legacy(&self) -> VaultResult<()> {
        if self.migrated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let raw = match self.storage.get(&self.config.legacy_storage_key)? {
            Some(raw) => raw,
            None => return Ok(()),
        };

        match CredentialToken::parse(&raw) {
            Ok(token) if !token.is_expired() => {
                self.store(&token)?;
                self.storage.remove(&self.config.legacy_storage_key)?;
                tracing::info!("Migrated legacy plaintext credential to encrypted storage");
            }
            _ => {
                self.storage.remove(&self.config.legacy_storage_key)?;
                tracing::info!("Discarded expired legacy credential");
            }
        }

        Ok(())
    }

    fn decrypt(&self, envelope: &CachedCredential) -> VaultResult<String> {
        let ciphertext = platform::crypto::from_base64(&envelope.ciphertext_b64)
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let plaintext =
            platform::crypto::keystream_xor(&self.config.obfuscation_secret, &ciphertext);

        String::from_utf8(plaintext).map_err(|e| VaultError::Storage(e.to_string()))
    }
}

/// Client-cache deployment mode: a fresh credential lands in the cache
impl crate::domain::repository::CredentialSink for CredentialCache {
    async fn establish(&self, credential: &CredentialToken) -> VaultResult<()> {
        self.store(credential)
    }
}

