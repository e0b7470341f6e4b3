//! MySQL storage engine.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

use keymint_core::config::store::StoreConfig;
use keymint_core::result::AppResult;
use keymint_core::types::pagination::LogPage;
use keymint_entity::{
    AdminUser, AuditLogEntry, License, LicenseStats, LicenseUpdate, NewAuditEntry, NewLicense,
};

use crate::backend::{LicenseStore, map_db_error, map_insert_error};
use crate::schema;

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    active: i64,
    revoked: i64,
    expired: i64,
    bound: i64,
}

/// License store backed by a MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MysqlStore {
    pool: MySqlPool,
}

impl MysqlStore {
    /// Connect the pool and bootstrap the schema.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| map_db_error(e, "Failed to connect to MySQL"))?;

        for statement in schema::MYSQL {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| map_db_error(e, "Failed to create MySQL tables"))?;
        }

        info!("MySQL store initialized");
        Ok(Self { pool })
    }

    /// Whether a license row with this key exists.
    ///
    /// MySQL reports changed rows rather than matched rows, so updates
    /// that leave values untouched need this to distinguish "no such key"
    /// from "nothing changed".
    async fn license_exists(&self, key: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM licenses WHERE license_key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to check license existence"))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl LicenseStore for MysqlStore {
    async fn create_license(&self, data: &NewLicense) -> AppResult<License> {
        let result = sqlx::query(
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

        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE id = ?")
            .bind(result.last_insert_id())
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
        // usage_count always changes, so MySQL's changed-rows convention
        // agrees with matched rows here.
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
        let result = sqlx::query(
            "UPDATE licenses SET is_active = FALSE WHERE license_key = ? AND is_active = TRUE",
        )
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

        let affected = result.rows_affected();
        if affected > 0 {
            return Ok(affected);
        }

        // Normalize to matched-row semantics: a no-op update on an
        // existing row still counts as one matched row.
        Ok(if self.license_exists(key).await? { 1 } else { 0 })
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
                COUNT(CASE WHEN is_active = TRUE THEN 1 END) AS active, \
                COUNT(CASE WHEN is_active = FALSE THEN 1 END) AS revoked, \
                COUNT(CASE WHEN expires_at < ? THEN 1 END) AS expired, \
                COUNT(CASE WHEN machine_id IS NOT NULL THEN 1 END) AS bound \
             FROM licenses",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to compute license stats"))?;

        Ok(LicenseStats {
            total: row.total as u64,
            active: row.active as u64,
            revoked: row.revoked as u64,
            expired: row.expired as u64,
            bound: row.bound as u64,
        })
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

        Ok(result.last_insert_id() as i64)
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
            "INSERT IGNORE INTO admin_users (username, password_hash, created_at) VALUES (?, ?, ?)",
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
            .map_err(|e| map_db_error(e, "MySQL health check failed"))?;
        Ok(())
    }
}
