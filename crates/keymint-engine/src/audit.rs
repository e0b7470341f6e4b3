//! Append-only audit trail over the store.

use std::sync::Arc;

use tracing::error;

use keymint_core::result::AppResult;
use keymint_core::types::pagination::LogPage;
use keymint_entity::{AuditLogEntry, NewAuditEntry};
use keymint_store::LicenseStore;

/// Records lifecycle and validation events.
///
/// Appends never influence the outcome of the operation that triggered
/// them: a failed append is reported through the log stream and dropped,
/// because the primary state change has already committed.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn LicenseStore>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger").finish()
    }
}

impl AuditLogger {
    /// Creates an audit logger over the shared store.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self { store }
    }

    /// Append one entry.
    pub async fn record(&self, entry: NewAuditEntry) {
        if let Err(e) = self.store.append_log(&entry).await {
            error!(
                license_key = %entry.license_key,
                action = %entry.action,
                error = %e,
                "Failed to append audit entry"
            );
        }
    }

    /// List entries, newest first.
    pub async fn list(&self, page: LogPage) -> AppResult<Vec<AuditLogEntry>> {
        self.store.list_logs(page.clamped()).await
    }
}
