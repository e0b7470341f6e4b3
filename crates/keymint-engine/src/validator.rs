//! The license validation state machine.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use keymint_core::error::AppError;
use keymint_core::result::AppResult;
use keymint_entity::{AuditAction, License, NewAuditEntry};
use keymint_store::LicenseStore;

use crate::audit::AuditLogger;
use crate::context::RequestMeta;
use crate::machine;

/// A successful validation: the license snapshot after binding and the
/// machine id it is bound to.
#[derive(Debug, Clone)]
pub struct Validated {
    /// License state after the usage increment.
    pub license: License,
    /// Machine id used for the binding check (caller-supplied or
    /// synthesized).
    pub machine_id: String,
}

/// Evaluates validation requests against the stored license state.
///
/// Rejections are evaluated in a fixed precedence order: unknown key,
/// revoked, expired, machine mismatch. Only then is the binding applied,
/// as one atomic conditional update; the engine never writes a binding
/// decision it derived from a prior read.
#[derive(Clone)]
pub struct ValidationEngine {
    store: Arc<dyn LicenseStore>,
    audit: AuditLogger,
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine").finish()
    }
}

impl ValidationEngine {
    /// Creates a validation engine over the shared store.
    pub fn new(store: Arc<dyn LicenseStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    /// Validate `key` for the requesting machine.
    ///
    /// A missing machine id is synthesized from host identity so
    /// unattended calls remain reproducible. Every call, accepted or
    /// rejected, appends exactly one `validation_attempt` audit entry
    /// with the outcome.
    pub async fn validate(
        &self,
        key: &str,
        machine_id: Option<&str>,
        meta: &RequestMeta,
    ) -> AppResult<Validated> {
        if key.trim().is_empty() {
            return Err(AppError::validation("License key is required"));
        }

        let machine_id = match machine_id {
            Some(m) if !m.trim().is_empty() => m.trim().to_string(),
            _ => machine::host_machine_id(),
        };

        let outcome = self.evaluate(key, &machine_id).await;

        let details = match &outcome {
            Ok(_) => json!({ "success": true }),
            Err(e) => json!({ "success": false, "reason": e.message }),
        };
        self.audit
            .record(NewAuditEntry {
                license_key: key.to_string(),
                action: AuditAction::ValidationAttempt,
                machine_id: Some(machine_id.clone()),
                ip_address: meta.ip_address.clone(),
                user_agent: meta.user_agent.clone(),
                timestamp: Utc::now(),
                details: Some(details),
            })
            .await;

        outcome
    }

    /// Run the state machine and, on the accepting path, the atomic bind.
    async fn evaluate(&self, key: &str, machine_id: &str) -> AppResult<Validated> {
        let now = Utc::now();

        let Some(license) = self.store.find_by_key(key).await? else {
            return Err(AppError::not_found("License not found"));
        };

        if !license.is_active {
            return Err(AppError::revoked("License has been revoked"));
        }

        if license.is_expired(now) {
            return Err(AppError::expired("License has expired"));
        }

        if let Some(bound) = &license.machine_id {
            if bound != machine_id {
                return Err(AppError::machine_mismatch(
                    "License is already in use on another machine",
                ));
            }
        }

        // The read above only pre-filters; the binding itself is decided
        // by the conditional update. Zero rows here means another machine
        // bound the license between the read and the write.
        let changed = self
            .store
            .bind_and_record_usage(key, machine_id, now)
            .await?;
        if !changed {
            return Err(AppError::machine_mismatch(
                "License is already in use on another machine",
            ));
        }

        debug!(license_key = key, machine_id, "License validated");

        let license = self
            .store
            .find_by_key(key)
            .await?
            .ok_or_else(|| AppError::internal("License row vanished after binding"))?;

        Ok(Validated {
            license,
            machine_id: machine_id.to_string(),
        })
    }
}
