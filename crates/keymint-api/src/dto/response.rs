//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keymint_entity::{AuditLogEntry, License, LicenseStats};

/// Full license record for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseSummary {
    /// Row id.
    pub id: i64,
    /// License key.
    pub key: String,
    /// Holder email.
    pub user_email: String,
    /// Holder name.
    pub user_name: String,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Whether the license is active.
    pub is_active: bool,
    /// Most recent successful validation.
    pub last_used: Option<DateTime<Utc>>,
    /// Successful validation count.
    pub usage_count: i64,
    /// Bound machine id, if any.
    pub machine_id: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl From<License> for LicenseSummary {
    fn from(license: License) -> Self {
        Self {
            id: license.id,
            key: license.license_key,
            user_email: license.user_email,
            user_name: license.user_name,
            created_at: license.created_at,
            expires_at: license.expires_at,
            is_active: license.is_active,
            last_used: license.last_used,
            usage_count: license.usage_count,
            machine_id: license.machine_id,
            notes: license.notes,
        }
    }
}

/// Body of a successful validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Always true here.
    pub success: bool,
    /// License snapshot after the usage increment.
    pub license: LicenseSummary,
    /// Machine id the license is bound to.
    pub machine_id: String,
}

/// Body carrying one license.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseResponse {
    /// Always true here.
    pub success: bool,
    /// The license record.
    pub license: LicenseSummary,
}

/// Body carrying the full license list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseListResponse {
    /// Always true here.
    pub success: bool,
    /// All licenses, newest created first.
    pub licenses: Vec<LicenseSummary>,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Always true here.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageResponse {
    /// Builds a success acknowledgement.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Aggregate counts body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsBody {
    /// Total licenses.
    pub total_licenses: u64,
    /// Active licenses.
    pub active_licenses: u64,
    /// Revoked licenses.
    pub revoked_licenses: u64,
    /// Expired licenses (as of the request).
    pub expired_licenses: u64,
    /// Licenses bound to a machine.
    pub used_licenses: u64,
    /// Licenses never bound.
    pub unused_licenses: u64,
}

impl From<LicenseStats> for StatsBody {
    fn from(stats: LicenseStats) -> Self {
        Self {
            total_licenses: stats.total,
            active_licenses: stats.active,
            revoked_licenses: stats.revoked,
            expired_licenses: stats.expired,
            used_licenses: stats.bound,
            unused_licenses: stats.total.saturating_sub(stats.bound),
        }
    }
}

/// Body of `GET /api/licenses/stats` and `GET /api/admin/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Always true here.
    pub success: bool,
    /// The counts.
    pub stats: StatsBody,
}

/// Admin summary returned on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummary {
    /// Admin username.
    pub username: String,
    /// Previous login timestamp.
    pub last_login: Option<DateTime<Utc>>,
}

/// Body of `POST /api/admin/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Always true here.
    pub success: bool,
    /// Signed session token.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Authenticated admin.
    pub admin: AdminSummary,
}

/// Body of `GET /api/admin/logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsResponse {
    /// Always true here.
    pub success: bool,
    /// Audit entries, newest first.
    pub logs: Vec<AuditLogEntry>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always true here.
    pub success: bool,
    /// Service status line.
    pub status: String,
    /// Active storage backend.
    pub backend: String,
}
