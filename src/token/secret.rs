//! Refresh secret generation and verification.
//!
//! The secret handed to the client is 32 random bytes, base64url-encoded.
//! Only its SHA-256 hash is stored in the session record, and presented
//! secrets are compared against that hash in constant time.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Stateless generator for refresh secrets.
pub struct RefreshSecret;

impl RefreshSecret {
    /// Generate a fresh opaque secret.
    #[must_use]
    pub fn generate() -> String {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; 32] = rng.gen();
        URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Hash a secret for storage.
    #[must_use]
    pub fn hash(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Constant-time check of a presented secret against a stored hash.
    #[must_use]
    pub fn matches(presented: &str, stored_hash: &str) -> bool {
        let presented_hash = Self::hash(presented);
        presented_hash
            .as_bytes()
            .ct_eq(stored_hash.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_secrets() {
        let s1 = RefreshSecret::generate();
        let s2 = RefreshSecret::generate();
        assert_ne!(s1, s2);
        assert_eq!(s1.len(), 43); // Base64 encoded 32 bytes
    }

    #[test]
    fn test_hash_deterministic() {
        let secret = "test-secret";
        assert_eq!(RefreshSecret::hash(secret), RefreshSecret::hash(secret));
    }

    #[test]
    fn test_matches_round_trip() {
        let secret = RefreshSecret::generate();
        let stored = RefreshSecret::hash(&secret);
        assert!(RefreshSecret::matches(&secret, &stored));
        assert!(!RefreshSecret::matches("something-else", &stored));
    }

    #[test]
    fn test_matches_rejects_raw_hash() {
        // Presenting the stored hash itself must not pass.
        let secret = RefreshSecret::generate();
        let stored = RefreshSecret::hash(&secret);
        assert!(!RefreshSecret::matches(&stored, &stored));
    }
}
