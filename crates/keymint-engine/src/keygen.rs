//! License key generation.

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a license key in hex characters.
pub const KEY_LENGTH: usize = 24;

/// Produces unique, unpredictable license keys.
///
/// A key is the SHA-256 digest of a high-resolution timestamp and 16
/// cryptographically random bytes, truncated to [`KEY_LENGTH`] uppercase
/// hex characters. The random component makes keys unguessable from the
/// timestamp alone; collision handling belongs to the store's uniqueness
/// constraint and the issuance retry loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator;

impl KeyGenerator {
    /// Creates a new key generator.
    pub fn new() -> Self {
        Self
    }

    /// Generates one fresh license key.
    pub fn generate(&self) -> String {
        let now = Utc::now();
        let timestamp = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros());

        let mut random = [0u8; 16];
        rand::rng().fill_bytes(&mut random);

        let mut hasher = Sha256::new();
        hasher.update(timestamp.to_be_bytes());
        hasher.update(random);
        let digest = hasher.finalize();

        digest[..KEY_LENGTH / 2]
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_key_format() {
        let key = KeyGenerator::new().generate();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, key.to_uppercase());
    }

    #[test]
    fn test_keys_are_unique() {
        let generator = KeyGenerator::new();
        let keys: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(keys.len(), 1000);
    }
}
