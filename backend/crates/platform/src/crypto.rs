//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Encode bytes as unpadded base64url
pub fn to_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url to bytes, tolerating padded input
pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s.trim_end_matches('='))
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// XOR data against a SHA-256 counter keystream derived from `secret`.
///
/// This is obfuscation against casual inspection of data at rest, not
/// confidentiality against an attacker who holds the application secret.
/// The operation is its own inverse: applying it twice with the same
/// secret yields the original data.
pub fn keystream_xor(secret: &[u8; 32], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut counter: u32 = 0;

    for chunk in data.chunks(32) {
        let mut hasher = Sha256::new();
        hasher.update(secret);
        hasher.update(counter.to_le_bytes());
        let block: [u8; 32] = hasher.finalize().into();

        for (byte, key) in chunk.iter().zip(block.iter()) {
            out.push(byte ^ key);
        }
        counter = counter.wrapping_add(1);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        // SHA-256 of empty string
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);

        // SHA-256 of "hello"
        let hash = sha256(b"hello");
        let expected =
            hex::decode("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_base64_roundtrip() {
        let data = b"hello world";
        let encoded = to_base64(data);
        let decoded = from_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64url_roundtrip() {
        let data = random_bytes(33);
        let encoded = to_base64url(&data);
        assert!(!encoded.contains('='));
        assert_eq!(from_base64url(&encoded).unwrap(), data);
    }

    #[test]
    fn test_base64url_tolerates_padding() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode(b"ab");
        assert!(padded.contains('='));
        assert_eq!(from_base64url(&padded).unwrap(), b"ab");
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8, 2, 3, 4];
        let b = [1u8, 2, 3, 4];
        let c = [1u8, 2, 3, 5];
        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &a[..3]));
    }

    #[test]
    fn test_keystream_xor_is_involution() {
        let secret = [7u8; 32];
        let data = b"a credential token that spans more than one keystream block";

        let obfuscated = keystream_xor(&secret, data);
        assert_ne!(obfuscated.as_slice(), data.as_slice());
        assert_eq!(keystream_xor(&secret, &obfuscated), data);
    }

    #[test]
    fn test_keystream_xor_depends_on_secret() {
        let data = b"same plaintext";
        let a = keystream_xor(&[1u8; 32], data);
        let b = keystream_xor(&[2u8; 32], data);
        assert_ne!(a, b);
    }

    #[test]
    fn test_keystream_xor_empty() {
        assert!(keystream_xor(&[0u8; 32], b"").is_empty());
    }
}
