//! Request DTOs.
//!
//! Input shape is rejected here, before any store access.

use serde::Deserialize;
use validator::Validate;

use keymint_entity::LicenseUpdate;

/// Body of `POST /api/licenses/validate`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ValidateRequest {
    /// License key to validate.
    #[validate(length(min = 1, message = "License key is required"))]
    pub license_key: String,
    /// Requesting machine id; synthesized from the host when absent.
    pub machine_id: Option<String>,
}

/// Body of license creation requests (public and admin).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLicenseRequest {
    /// Email of the license holder.
    #[validate(email(message = "A valid user email is required"))]
    pub user_email: String,
    /// Display name of the license holder.
    #[validate(length(min = 1, max = 255, message = "User name is required"))]
    pub user_name: String,
    /// License duration in days; server default applies when absent.
    pub duration_days: Option<u32>,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Body of revocation requests.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RevokeRequest {
    /// License key to revoke.
    #[validate(length(min = 1, message = "License key is required"))]
    pub license_key: String,
}

/// Body of `POST /api/admin/login`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Admin username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Admin password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `PUT /api/admin/licenses/{key}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLicenseRequest {
    /// New holder email.
    pub user_email: Option<String>,
    /// New holder name.
    pub user_name: Option<String>,
    /// New notes text.
    pub notes: Option<String>,
    /// Activate or revoke.
    pub is_active: Option<bool>,
    /// Rebind to a machine; empty string unbinds.
    pub machine_id: Option<String>,
}

impl From<UpdateLicenseRequest> for LicenseUpdate {
    fn from(req: UpdateLicenseRequest) -> Self {
        Self {
            user_email: req.user_email,
            user_name: req.user_name,
            notes: req.notes,
            is_active: req.is_active,
            machine_id: req.machine_id,
        }
    }
}

/// Query string of `GET /api/admin/logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    /// Maximum entries to return.
    pub limit: Option<u32>,
    /// Entries to skip.
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_bad_email() {
        let req = CreateLicenseRequest {
            user_email: "not-an-email".to_string(),
            user_name: "User".to_string(),
            duration_days: None,
            notes: None,
        };
        assert!(req.validate().is_err());

        let req = CreateLicenseRequest {
            user_email: "user@example.com".to_string(),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_request_requires_key() {
        let req = ValidateRequest {
            license_key: String::new(),
            machine_id: None,
        };
        assert!(req.validate().is_err());
    }
}
