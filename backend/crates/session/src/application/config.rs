//! Application Configuration
//!
//! Configuration for the session application layer.

use std::time::Duration;

/// Re-export cookie types from platform
pub use platform::cookie::{CookieConfig, SameSite};

/// Session application configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session cookie settings (name, flags, max-age)
    pub cookie: CookieConfig,
    /// Secret key for HMAC-signing cookie values (32 bytes)
    pub session_secret: [u8; 32],
    /// Default session lifetime (24 hours); independent of the wrapped
    /// credential's own expiry
    pub session_lifetime: Duration,
    /// Interval of the background expired-session sweep (1 hour)
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig::default(),
            session_secret: [0u8; 32],
            session_lifetime: Duration::from_secs(24 * 3600),
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl SessionConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, random secret)
    pub fn development() -> Self {
        Self {
            cookie: CookieConfig::insecure_dev(),
            ..Self::with_random_secret()
        }
    }

    /// Get session lifetime in milliseconds
    pub fn session_lifetime_ms(&self) -> i64 {
        self.session_lifetime.as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();

        assert_eq!(config.session_lifetime, Duration::from_secs(24 * 3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
        assert_eq!(config.cookie.same_site, SameSite::Strict);
        assert!(config.cookie.http_only);
        assert!(config.cookie.secure);
    }

    #[test]
    fn test_with_random_secret() {
        let a = SessionConfig::with_random_secret();
        let b = SessionConfig::with_random_secret();

        assert_ne!(a.session_secret, b.session_secret);
        assert!(a.session_secret.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_development_config() {
        let config = SessionConfig::development();

        assert!(!config.cookie.secure);
        assert!(config.session_secret.iter().any(|&b| b != 0));
    }
}
