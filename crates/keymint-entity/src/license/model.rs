//! License entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted software license.
///
/// `license_key` is unique across all time; keys are never reused, even
/// after a license row is deleted. `machine_id`, once set, changes only
/// through an explicit admin update.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct License {
    /// Surrogate row identifier.
    pub id: i64,
    /// 24-character uppercase hex license key.
    pub license_key: String,
    /// Machine the license is bound to (None = unbound).
    pub machine_id: Option<String>,
    /// Email of the license holder.
    pub user_email: String,
    /// Display name of the license holder.
    pub user_name: String,
    /// When the license was issued.
    pub created_at: DateTime<Utc>,
    /// When the license expires. Always after `created_at`.
    pub expires_at: DateTime<Utc>,
    /// False once revoked; terminal for validation.
    pub is_active: bool,
    /// Timestamp of the most recent successful validation.
    pub last_used: Option<DateTime<Utc>>,
    /// Number of successful validations. Monotonically non-decreasing.
    pub usage_count: i64,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Lifecycle state of a license, evaluated at a point in time.
///
/// `Expired` is computed from `expires_at`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseState {
    /// Active, unexpired, not yet bound to a machine.
    Unbound,
    /// Active, unexpired, bound to a machine.
    BoundActive,
    /// Past `expires_at` at the evaluation instant.
    Expired,
    /// Revoked (`is_active` false); terminal through the validation engine.
    Revoked,
}

impl License {
    /// Whether the license has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Evaluate the lifecycle state as of `now`.
    ///
    /// Revocation takes precedence over expiry, matching the order the
    /// validation engine rejects in.
    pub fn state(&self, now: DateTime<Utc>) -> LicenseState {
        if !self.is_active {
            LicenseState::Revoked
        } else if self.is_expired(now) {
            LicenseState::Expired
        } else if self.machine_id.is_some() {
            LicenseState::BoundActive
        } else {
            LicenseState::Unbound
        }
    }
}

/// Data required to persist a new license.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLicense {
    /// Freshly generated license key.
    pub license_key: String,
    /// Email of the license holder.
    pub user_email: String,
    /// Display name of the license holder.
    pub user_name: String,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp. Must be after `created_at`.
    pub expires_at: DateTime<Utc>,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Partial field set for an admin license update.
///
/// `None` fields are left untouched. `machine_id` is the only path by
/// which an existing binding may be changed; an empty string clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenseUpdate {
    /// New holder email.
    pub user_email: Option<String>,
    /// New holder name.
    pub user_name: Option<String>,
    /// New notes text.
    pub notes: Option<String>,
    /// Activate or revoke the license.
    pub is_active: Option<bool>,
    /// Rebind to a machine; empty string unbinds.
    pub machine_id: Option<String>,
}

impl LicenseUpdate {
    /// Whether the update carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.user_email.is_none()
            && self.user_name.is_none()
            && self.notes.is_none()
            && self.is_active.is_none()
            && self.machine_id.is_none()
    }
}

/// Aggregate license counts.
///
/// `expired` is computed against the query-time clock supplied by the
/// caller, not a stored flag.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LicenseStats {
    /// Total number of licenses.
    pub total: u64,
    /// Licenses with `is_active` true.
    pub active: u64,
    /// Licenses with `is_active` false.
    pub revoked: u64,
    /// Licenses past their expiry at query time.
    pub expired: u64,
    /// Licenses bound to a machine.
    pub bound: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> License {
        License {
            id: 1,
            license_key: "A".repeat(24),
            machine_id: None,
            user_email: "user@example.com".to_string(),
            user_name: "User".to_string(),
            created_at: now - Duration::days(1),
            expires_at: now + Duration::days(30),
            is_active: true,
            last_used: None,
            usage_count: 0,
            notes: None,
        }
    }

    #[test]
    fn test_state_unbound() {
        let now = Utc::now();
        assert_eq!(sample(now).state(now), LicenseState::Unbound);
    }

    #[test]
    fn test_state_bound_active() {
        let now = Utc::now();
        let mut lic = sample(now);
        lic.machine_id = Some("m1".to_string());
        assert_eq!(lic.state(now), LicenseState::BoundActive);
    }

    #[test]
    fn test_state_expired_regardless_of_binding() {
        let now = Utc::now();
        let mut lic = sample(now);
        lic.expires_at = now - Duration::seconds(1);
        lic.machine_id = Some("m1".to_string());
        assert_eq!(lic.state(now), LicenseState::Expired);
    }

    #[test]
    fn test_state_revoked_takes_precedence_over_expired() {
        let now = Utc::now();
        let mut lic = sample(now);
        lic.is_active = false;
        lic.expires_at = now - Duration::days(1);
        assert_eq!(lic.state(now), LicenseState::Revoked);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(LicenseUpdate::default().is_empty());
        let update = LicenseUpdate {
            notes: Some("renewed".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
