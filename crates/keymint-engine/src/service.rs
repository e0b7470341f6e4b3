//! License issuance and administration.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use keymint_core::config::license::LicenseConfig;
use keymint_core::error::{AppError, ErrorKind};
use keymint_core::result::AppResult;
use keymint_entity::{
    AuditAction, License, LicenseState, LicenseStats, LicenseUpdate, NewAuditEntry, NewLicense,
};
use keymint_store::LicenseStore;

use crate::audit::AuditLogger;
use crate::context::RequestMeta;
use crate::keygen::KeyGenerator;

/// Parameters for issuing a new license.
#[derive(Debug, Clone)]
pub struct IssueLicense {
    /// Email of the license holder.
    pub user_email: String,
    /// Display name of the license holder.
    pub user_name: String,
    /// License duration in days; the configured default applies when
    /// absent.
    pub duration_days: Option<u32>,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// Orchestrates license issuance, inspection, and admin mutations.
///
/// Every state-changing operation appends its own distinctly-named audit
/// entry; admin-initiated entries carry the acting username in the
/// details payload.
#[derive(Clone)]
pub struct LicenseService {
    store: Arc<dyn LicenseStore>,
    audit: AuditLogger,
    keygen: KeyGenerator,
    config: LicenseConfig,
}

impl std::fmt::Debug for LicenseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseService")
            .field("config", &self.config)
            .finish()
    }
}

impl LicenseService {
    /// Creates a license service over the shared store.
    pub fn new(store: Arc<dyn LicenseStore>, audit: AuditLogger, config: LicenseConfig) -> Self {
        Self {
            store,
            audit,
            keygen: KeyGenerator::new(),
            config,
        }
    }

    /// Issue a new license with a freshly generated key.
    ///
    /// A key collision is retried with fresh randomness up to the
    /// configured attempt count; collisions surviving that many retries
    /// indicate a deeper fault and surface as `Duplicate`.
    pub async fn issue(
        &self,
        request: IssueLicense,
        admin: Option<&str>,
        meta: &RequestMeta,
    ) -> AppResult<License> {
        if request.user_email.trim().is_empty() || request.user_name.trim().is_empty() {
            return Err(AppError::validation("User email and name are required"));
        }

        let duration_days = request
            .duration_days
            .unwrap_or(self.config.default_duration_days);
        if duration_days == 0 {
            return Err(AppError::validation("Duration must be at least one day"));
        }

        let attempts = self.config.key_generation_attempts.max(1);
        let mut last_collision = None;

        for attempt in 1..=attempts {
            let now = Utc::now();
            let data = NewLicense {
                license_key: self.keygen.generate(),
                user_email: request.user_email.clone(),
                user_name: request.user_name.clone(),
                created_at: now,
                expires_at: now + Duration::days(i64::from(duration_days)),
                notes: request.notes.clone(),
            };

            match self.store.create_license(&data).await {
                Ok(license) => {
                    let action = if admin.is_some() {
                        AuditAction::AdminLicenseCreated
                    } else {
                        AuditAction::LicenseCreated
                    };
                    let mut details = json!({
                        "user_email": license.user_email,
                        "user_name": license.user_name,
                        "duration_days": duration_days,
                    });
                    if let Some(admin) = admin {
                        details["admin"] = json!(admin);
                    }
                    self.audit
                        .record(NewAuditEntry {
                            license_key: license.license_key.clone(),
                            action,
                            machine_id: None,
                            ip_address: meta.ip_address.clone(),
                            user_agent: meta.user_agent.clone(),
                            timestamp: Utc::now(),
                            details: Some(details),
                        })
                        .await;

                    info!(license_key = %license.license_key, "License issued");
                    return Ok(license);
                }
                Err(e) if e.kind == ErrorKind::Duplicate => {
                    warn!(attempt, "License key collision, regenerating");
                    last_collision = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_collision
            .unwrap_or_else(|| AppError::duplicate("License key generation exhausted retries")))
    }

    /// Read-only license summary, reported only while currently valid.
    ///
    /// Never binds, increments usage, or writes anything.
    pub async fn info(&self, key: &str) -> AppResult<License> {
        if key.trim().is_empty() {
            return Err(AppError::validation("License key is required"));
        }

        let Some(license) = self.store.find_by_key(key).await? else {
            return Err(AppError::not_found("License not found"));
        };

        match license.state(Utc::now()) {
            LicenseState::Revoked => Err(AppError::revoked("License has been revoked")),
            LicenseState::Expired => Err(AppError::expired("License has expired")),
            LicenseState::Unbound | LicenseState::BoundActive => Ok(license),
        }
    }

    /// Deactivate a license.
    pub async fn revoke(
        &self,
        key: &str,
        admin: Option<&str>,
        meta: &RequestMeta,
    ) -> AppResult<()> {
        if key.trim().is_empty() {
            return Err(AppError::validation("License key is required"));
        }

        let changed = self.store.revoke(key).await?;
        if changed == 0 {
            return Err(AppError::not_found("License not found"));
        }

        let action = if admin.is_some() {
            AuditAction::AdminLicenseRevoked
        } else {
            AuditAction::LicenseRevoked
        };
        let details = admin.map(|admin| json!({ "admin": admin }));
        self.audit
            .record(NewAuditEntry {
                license_key: key.to_string(),
                action,
                machine_id: None,
                ip_address: meta.ip_address.clone(),
                user_agent: meta.user_agent.clone(),
                timestamp: Utc::now(),
                details,
            })
            .await;

        info!(license_key = key, "License revoked");
        Ok(())
    }

    /// Apply an admin field update.
    ///
    /// This is the only path that may change an existing machine binding.
    pub async fn update(
        &self,
        key: &str,
        fields: LicenseUpdate,
        admin: &str,
        meta: &RequestMeta,
    ) -> AppResult<()> {
        if key.trim().is_empty() {
            return Err(AppError::validation("License key is required"));
        }
        if fields.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let changed = self.store.update(key, &fields).await?;
        if changed == 0 {
            return Err(AppError::not_found("License not found"));
        }

        self.audit
            .record(NewAuditEntry {
                license_key: key.to_string(),
                action: AuditAction::AdminLicenseUpdated,
                machine_id: None,
                ip_address: meta.ip_address.clone(),
                user_agent: meta.user_agent.clone(),
                timestamp: Utc::now(),
                details: Some(json!({ "admin": admin, "updates": fields })),
            })
            .await;

        info!(license_key = key, "License updated");
        Ok(())
    }

    /// Hard-delete a license row. Its key is never reissued and its audit
    /// entries persist.
    pub async fn delete(&self, key: &str, admin: &str, meta: &RequestMeta) -> AppResult<()> {
        if key.trim().is_empty() {
            return Err(AppError::validation("License key is required"));
        }

        let changed = self.store.delete(key).await?;
        if changed == 0 {
            return Err(AppError::not_found("License not found"));
        }

        self.audit
            .record(NewAuditEntry {
                license_key: key.to_string(),
                action: AuditAction::AdminLicenseDeleted,
                machine_id: None,
                ip_address: meta.ip_address.clone(),
                user_agent: meta.user_agent.clone(),
                timestamp: Utc::now(),
                details: Some(json!({ "admin": admin })),
            })
            .await;

        info!(license_key = key, "License deleted");
        Ok(())
    }

    /// All licenses, newest created first.
    pub async fn list(&self) -> AppResult<Vec<License>> {
        self.store.list_all().await
    }

    /// Aggregate counts as of now.
    pub async fn stats(&self) -> AppResult<LicenseStats> {
        self.store.stats(Utc::now()).await
    }
}
