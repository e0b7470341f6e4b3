//! Audit action names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle or validation event an audit entry records.
///
/// Stored in the log as the snake_case string form; every state-changing
/// operation writes its own distinctly-named action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A validation call, accepted or rejected.
    ValidationAttempt,
    /// Self-service license issuance.
    LicenseCreated,
    /// Self-service license revocation.
    LicenseRevoked,
    /// Admin-initiated license issuance.
    AdminLicenseCreated,
    /// Admin-initiated license revocation.
    AdminLicenseRevoked,
    /// Admin-initiated license field update.
    AdminLicenseUpdated,
    /// Admin-initiated hard delete.
    AdminLicenseDeleted,
}

impl AuditAction {
    /// The string form persisted in the log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationAttempt => "validation_attempt",
            Self::LicenseCreated => "license_created",
            Self::LicenseRevoked => "license_revoked",
            Self::AdminLicenseCreated => "admin_license_created",
            Self::AdminLicenseRevoked => "admin_license_revoked",
            Self::AdminLicenseUpdated => "admin_license_updated",
            Self::AdminLicenseDeleted => "admin_license_deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_string_forms() {
        assert_eq!(AuditAction::ValidationAttempt.as_str(), "validation_attempt");
        assert_eq!(
            AuditAction::AdminLicenseDeleted.to_string(),
            "admin_license_deleted"
        );
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&AuditAction::AdminLicenseUpdated).expect("serialize");
        assert_eq!(json, "\"admin_license_updated\"");
    }
}
