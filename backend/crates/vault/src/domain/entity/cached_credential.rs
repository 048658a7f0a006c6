//! Cached Credential Entity
//!
//! The envelope persisted by the credential cache: obfuscated token bytes
//! plus the binding metadata checked on every read.

use serde::{Deserialize, Serialize};

/// Credential envelope at rest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCredential {
    /// Obfuscated raw token, base64-encoded
    pub ciphertext_b64: String,
    /// Device fingerprint captured at store time
    pub fingerprint: String,
    /// Store timestamp (Unix timestamp ms)
    pub stored_at_ms: i64,
}

impl CachedCredential {
    /// Age of this entry at the given clock, in milliseconds
    pub fn age_ms_at(&self, now_ms: i64) -> i64 {
        (now_ms - self.stored_at_ms).max(0)
    }

    /// Whether the entry has outlived the maximum cache age.
    ///
    /// Independent of the wrapped token's own expiry.
    pub fn exceeds_max_age(&self, now_ms: i64, max_age_ms: i64) -> bool {
        self.age_ms_at(now_ms) > max_age_ms
    }
}
