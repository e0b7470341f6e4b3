//! Embedded SQLite storage engine.
//!
//! All writes are serialized through a single pooled connection, so the
//! atomic conditional update in [`bind_and_record_usage`] is never
//! interleaved with another writer.
//!
//! [`bind_and_record_usage`]: LicenseStore::bind_and_record_usage

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use keymint_core::config::store::StoreConfig;
use keymint_core::result::AppResult;
use keymint_core::types::pagination::LogPage;
use keymint_entity::{
    AdminUser, AuditLogEntry, License, LicenseStats, LicenseUpdate, NewAuditEntry, NewLicense,
};

use crate::backend::{LicenseStore, map_db_error, map_insert_error};
use crate::schema;

/// Aggregate counts row shared by the stats queries.
#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    active: i64,
    revoked: i64,
    expired: i64,
    bound: i64,
}

impl From<StatsRow> for LicenseStats {
    fn from(row: StatsRow) -> Self {
        Self {
            total: row.total as u64,
            active: row.active as u64,
            revoked: row.revoked as u64,
            expired: row.expired as u64,
            bound: row.bound as u64,
        }
    }
}

/// License store backed by an embedded SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database and bootstrap the schema.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| map_db_error(e, "Invalid SQLite URL"))?
            .create_if_missing(true);

        // Single connection: SQLite writes go through one writer queue.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| map_db_error(e, "Failed to open SQLite database"))?;

        for statement in schema::SQLITE {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| map_db_error(e, "Failed to create SQLite tables"))?;
        }

        info!("SQLite store initialized");
        Ok(Self { pool })
    }

    /// Open an in-memory database (test instances).
    pub async fn connect_in_memory() -> AppResult<Self> {
        let config = StoreConfig {
            url: "sqlite::memory:".to_string(),
            ..StoreConfig::default()
        };
        Self::connect(&config).await
    }
}

#[async_trait]
impl LicenseStore for SqliteStore {
    async fn create_license(&self, data: &NewLicense) -> AppResult<License> {
        sqlx::query(
            "INSERT INTO licenses (license_key, user_email, user_name, created_at, expires_at, notes) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&data.license_key)
        .bind(&data.user_email)
        .bind(&data.user_name)
        .bind(data.created_at)
        .bind(data.expires_at)
        .bind(&data.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "license"))?;

        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE license_key = ?")
            .bind(&data.license_key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to read back created license"))
    }

    async fn find_by_key(&self, key: &str) -> AppResult<Option<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE license_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to find license"))
    }

    async fn bind_and_record_usage(
        &self,
        key: &str,
        machine_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE licenses \
             SET machine_id = ?, usage_count = usage_count + 1, last_used = ? \
             WHERE license_key = ? AND (machine_id IS NULL OR machine_id = ?)",
        )
        .bind(machine_id)
        .bind(now)
        .bind(key)
        .bind(machine_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to bind license"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke(&self, key: &str) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE licenses SET is_active = 0 WHERE license_key = ? AND is_active = 1")
                .bind(key)
                .execute(&self.pool)
                .await
                .map_err(|e| map_db_error(e, "Failed to revoke license"))?;
        Ok(result.rows_affected())
    }

    async fn update(&self, key: &str, fields: &LicenseUpdate) -> AppResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mut sets = Vec::new();
        if fields.user_email.is_some() {
            sets.push("user_email = ?");
        }
        if fields.user_name.is_some() {
            sets.push("user_name = ?");
        }
        if fields.notes.is_some() {
            sets.push("notes = ?");
        }
        if fields.is_active.is_some() {
            sets.push("is_active = ?");
        }
        if fields.machine_id.is_some() {
            sets.push("machine_id = ?");
        }

        let sql = format!(
            "UPDATE licenses SET {} WHERE license_key = ?",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(v) = &fields.user_email {
            query = query.bind(v);
        }
        if let Some(v) = &fields.user_name {
            query = query.bind(v);
        }
        if let Some(v) = &fields.notes {
            query = query.bind(v);
        }
        if let Some(v) = fields.is_active {
            query = query.bind(v);
        }
        if let Some(v) = &fields.machine_id {
            // Empty string unbinds the machine.
            let value = if v.is_empty() { None } else { Some(v.as_str()) };
            query = query.bind(value);
        }

        let result = query
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to update license"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, key: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM licenses WHERE license_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to delete license"))?;
        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> AppResult<Vec<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to list licenses"))
    }

    async fn stats(&self, now: DateTime<Utc>) -> AppResult<LicenseStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT \
                COUNT(*) AS total, \
                COUNT(CASE WHEN is_active = 1 THEN 1 END) AS active, \
                COUNT(CASE WHEN is_active = 0 THEN 1 END) AS revoked, \
                COUNT(CASE WHEN expires_at < ? THEN 1 END) AS expired, \
                COUNT(CASE WHEN machine_id IS NOT NULL THEN 1 END) AS bound \
             FROM licenses",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to compute license stats"))?;
        Ok(row.into())
    }

    async fn append_log(&self, entry: &NewAuditEntry) -> AppResult<i64> {
        let result = sqlx::query(
            "INSERT INTO license_logs (license_key, action, machine_id, ip_address, user_agent, timestamp, details) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.license_key)
        .bind(entry.action.as_str())
        .bind(&entry.machine_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.timestamp)
        .bind(entry.details_text())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "audit entry"))?;

        Ok(result.last_insert_rowid())
    }

    async fn list_logs(&self, page: LogPage) -> AppResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM license_logs ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to list audit entries"))
    }

    async fn find_admin(&self, username: &str) -> AppResult<Option<AdminUser>> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to find admin user"))
    }

    async fn touch_admin_login(&self, username: &str, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("UPDATE admin_users SET last_login = ? WHERE username = ?")
            .bind(now)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to record admin login"))?;
        Ok(result.rows_affected())
    }

    async fn ensure_admin(
        &self,
        username: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO admin_users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to create bootstrap admin"))?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "SQLite health check failed"))?;
        Ok(())
    }
}
