//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::action::AuditAction;

/// An immutable audit log entry recording one lifecycle or validation event.
///
/// Entries are append-only and are never updated or deleted; entries for
/// deleted licenses persist, so `license_key` is a plain reference with no
/// foreign key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Surrogate row identifier.
    pub id: i64,
    /// Key of the license the event concerns.
    pub license_key: String,
    /// Action name (see [`AuditAction`]).
    pub action: String,
    /// Machine identifier involved, if any.
    pub machine_id: Option<String>,
    /// Client IP address, if known.
    pub ip_address: Option<String>,
    /// Client User-Agent, if known.
    pub user_agent: Option<String>,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Structured event details, serialized as JSON text.
    pub details: Option<String>,
}

/// Data required to append a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Key of the license the event concerns.
    pub license_key: String,
    /// Action being recorded.
    pub action: AuditAction,
    /// Machine identifier involved, if any.
    pub machine_id: Option<String>,
    /// Client IP address, if known.
    pub ip_address: Option<String>,
    /// Client User-Agent, if known.
    pub user_agent: Option<String>,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
    /// Structured event details.
    pub details: Option<serde_json::Value>,
}

impl NewAuditEntry {
    /// Serialize the structured details for storage as text.
    pub fn details_text(&self) -> Option<String> {
        self.details.as_ref().map(|v| v.to_string())
    }
}
