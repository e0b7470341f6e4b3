//! Admin credential check and session token issuance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use keymint_core::config::auth::AuthConfig;
use keymint_core::error::AppError;
use keymint_core::result::AppResult;
use keymint_store::LicenseStore;

use crate::jwt::claims::AdminClaims;
use crate::jwt::decoder::JwtDecoder;
use crate::jwt::encoder::JwtEncoder;
use crate::password::hasher::PasswordHasher;

/// Result of a successful admin login.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AdminSession {
    /// Signed session token.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Authenticated admin username.
    pub username: String,
    /// Previous login timestamp, if any.
    pub last_login: Option<DateTime<Utc>>,
}

/// Authenticates administrators against the persisted admin account and
/// issues/verifies session tokens.
#[derive(Clone)]
pub struct AdminAuthenticator {
    store: Arc<dyn LicenseStore>,
    hasher: PasswordHasher,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl std::fmt::Debug for AdminAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthenticator")
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl AdminAuthenticator {
    /// Creates an authenticator from configuration and the shared store.
    pub fn new(config: &AuthConfig, store: Arc<dyn LicenseStore>) -> AppResult<Self> {
        Ok(Self {
            store,
            hasher: PasswordHasher::new(config)?,
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
        })
    }

    /// Creates the bootstrap admin account if the username is absent.
    pub async fn ensure_bootstrap_admin(&self, username: &str, password: &str) -> AppResult<()> {
        let hash = self.hasher.hash_password(password)?;
        self.store.ensure_admin(username, &hash, Utc::now()).await?;
        info!(username, "Bootstrap admin ensured");
        Ok(())
    }

    /// Verifies credentials and issues a session token.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AdminSession> {
        let Some(admin) = self.store.find_admin(username).await? else {
            warn!(username, "Login attempt for unknown admin");
            return Err(AppError::auth("Invalid credentials"));
        };

        if !self.hasher.verify_password(password, &admin.password_hash)? {
            warn!(username, "Login attempt with wrong password");
            return Err(AppError::auth("Invalid credentials"));
        }

        self.store.touch_admin_login(username, Utc::now()).await?;
        let (token, expires_at) = self.encoder.issue(&admin)?;

        info!(username, "Admin login succeeded");
        Ok(AdminSession {
            token,
            expires_at,
            username: admin.username,
            last_login: admin.last_login,
        })
    }

    /// Validates a session token and returns its claims.
    pub fn verify(&self, token: &str) -> AppResult<AdminClaims> {
        self.decoder.verify(token)
    }
}
