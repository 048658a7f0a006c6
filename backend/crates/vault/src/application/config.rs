//! Application Configuration
//!
//! Configuration for the client-side credential cache and refresh
//! scheduling.

use std::time::Duration;

/// Seed for the default obfuscation secret. The keyed XOR over this secret
/// deters casual inspection of storage dumps only; it is not, and must not
/// be presented as, strong confidentiality.
const OBFUSCATION_SEED: &[u8] = b"panel-credential-cache-v2";

/// Vault application configuration
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Fixed application secret keying the at-rest obfuscation
    pub obfuscation_secret: [u8; 32],
    /// Maximum storage age of a cached credential (24 hours), enforced on
    /// every read independently of the token's own expiry
    pub max_cache_age: Duration,
    /// How far before token expiry a refresh fires (5 minutes)
    pub refresh_lead: Duration,
    /// Watchdog tick re-checking for silently missed refresh deadlines
    /// (60 seconds)
    pub watchdog_interval: Duration,
    /// Storage slot of the encrypted envelope
    pub storage_key: String,
    /// Storage slot legacy plaintext deployments used
    pub legacy_storage_key: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            obfuscation_secret: platform::crypto::sha256(OBFUSCATION_SEED),
            max_cache_age: Duration::from_secs(24 * 3600),
            refresh_lead: Duration::from_secs(5 * 60),
            watchdog_interval: Duration::from_secs(60),
            storage_key: "panel.credential.v2".to_string(),
            legacy_storage_key: "panel.credential".to_string(),
        }
    }
}

impl VaultConfig {
    /// Config with a deployment-provided obfuscation secret
    pub fn with_secret(secret: [u8; 32]) -> Self {
        Self {
            obfuscation_secret: secret,
            ..Default::default()
        }
    }

    /// Maximum cache age in milliseconds
    pub fn max_cache_age_ms(&self) -> i64 {
        self.max_cache_age.as_millis() as i64
    }

    /// Refresh lead time in milliseconds
    pub fn refresh_lead_ms(&self) -> i64 {
        self.refresh_lead.as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();

        assert_eq!(config.max_cache_age, Duration::from_secs(24 * 3600));
        assert_eq!(config.refresh_lead, Duration::from_secs(300));
        assert_eq!(config.watchdog_interval, Duration::from_secs(60));
        assert_ne!(config.storage_key, config.legacy_storage_key);
        assert!(config.obfuscation_secret.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_with_secret() {
        let config = VaultConfig::with_secret([9u8; 32]);
        assert_eq!(config.obfuscation_secret, [9u8; 32]);
        assert_ne!(
            VaultConfig::default().obfuscation_secret,
            config.obfuscation_secret
        );
    }
}
