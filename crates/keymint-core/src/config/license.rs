//! License issuance configuration.

use serde::{Deserialize, Serialize};

/// License issuance policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Default license duration in days when the caller supplies none.
    #[serde(default = "default_duration_days")]
    pub default_duration_days: u32,
    /// Number of key generation attempts before a duplicate-key collision
    /// is surfaced to the caller.
    #[serde(default = "default_key_attempts")]
    pub key_generation_attempts: u32,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            default_duration_days: default_duration_days(),
            key_generation_attempts: default_key_attempts(),
        }
    }
}

fn default_duration_days() -> u32 {
    365
}

fn default_key_attempts() -> u32 {
    3
}
