//! Host machine identifier synthesis.
//!
//! When a validation request carries no machine id, the engine derives one
//! from host identity attributes so unattended calls stay reproducible
//! across invocations on the same host.

use sha2::{Digest, Sha256};

/// Length of a synthesized machine id in hex characters.
pub const MACHINE_ID_LENGTH: usize = 16;

/// Derive a stable identifier for the current host.
///
/// Hashes the sorted non-loopback MAC addresses together with the
/// hostname; hosts without readable interfaces fall back to hostname
/// alone. The result is deterministic for an unchanged host.
pub fn host_machine_id() -> String {
    let mut components = mac_addresses();
    components.push(hostname());

    let combined = components.join("|");
    let digest = Sha256::digest(combined.as_bytes());

    digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()[..MACHINE_ID_LENGTH]
        .to_string()
}

/// Sorted, deduplicated non-loopback MAC addresses.
fn mac_addresses() -> Vec<String> {
    let mut macs = Vec::new();

    if let Ok(entries) = std::fs::read_dir("/sys/class/net") {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name == "lo" {
                continue;
            }
            if let Ok(mac) = std::fs::read_to_string(entry.path().join("address")) {
                let mac = mac.trim().to_lowercase();
                if !mac.is_empty() && mac != "00:00:00:00:00:00" {
                    macs.push(mac.chars().filter(|c| *c != ':').collect());
                }
            }
        }
    }

    macs.sort();
    macs.dedup();
    macs
}

fn hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}
