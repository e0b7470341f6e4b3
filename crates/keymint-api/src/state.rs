//! Application state shared across all handlers.

use std::sync::Arc;

use keymint_auth::AdminAuthenticator;
use keymint_core::config::AppConfig;
use keymint_engine::{AuditLogger, LicenseService, ValidationEngine};
use keymint_store::LicenseStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks; the store is injected
/// once at startup and no handler knows which engine backs it.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The persistence contract.
    pub store: Arc<dyn LicenseStore>,
    /// Admin credential check and token verification.
    pub authenticator: Arc<AdminAuthenticator>,
    /// The validation state machine.
    pub engine: Arc<ValidationEngine>,
    /// License issuance and administration.
    pub licenses: Arc<LicenseService>,
    /// Audit trail reads.
    pub audit: Arc<AuditLogger>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
