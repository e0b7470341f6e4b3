//! Admin user entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An administrator account.
///
/// Created once at startup (the bootstrap admin) if absent; mutated only
/// on login, which updates `last_login`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminUser {
    /// Surrogate row identifier.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Argon2id password hash (PHC string).
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent successful login.
    pub last_login: Option<DateTime<Utc>>,
}
