//! PostgreSQL storage engine.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
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

/// License store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect the pool and bootstrap the schema.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| map_db_error(e, "Failed to connect to PostgreSQL"))?;

        for statement in schema::POSTGRES {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| map_db_error(e, "Failed to create PostgreSQL tables"))?;
        }

        info!("PostgreSQL store initialized");
        Ok(Self { pool })
    }
}

#[async_trait]
impl LicenseStore for PostgresStore {
    async fn create_license(&self, data: &NewLicense) -> AppResult<License> {
        sqlx::query_as::<_, License>(
            "INSERT INTO licenses (license_key, user_email, user_name, created_at, expires_at, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&data.license_key)
        .bind(&data.user_email)
        .bind(&data.user_name)
        .bind(data.created_at)
        .bind(data.expires_at)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "license"))
    }

    async fn find_by_key(&self, key: &str) -> AppResult<Option<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE license_key = $1")
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
             SET machine_id = $1, usage_count = usage_count + 1, last_used = $2 \
             WHERE license_key = $3 AND (machine_id IS NULL OR machine_id = $1)",
        )
        .bind(machine_id)
        .bind(now)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to bind license"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke(&self, key: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE licenses SET is_active = FALSE WHERE license_key = $1 AND is_active = TRUE",
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
        let mut param_idx = 1u32;
        if fields.user_email.is_some() {
            sets.push(format!("user_email = ${param_idx}"));
            param_idx += 1;
        }
        if fields.user_name.is_some() {
            sets.push(format!("user_name = ${param_idx}"));
            param_idx += 1;
        }
        if fields.notes.is_some() {
            sets.push(format!("notes = ${param_idx}"));
            param_idx += 1;
        }
        if fields.is_active.is_some() {
            sets.push(format!("is_active = ${param_idx}"));
            param_idx += 1;
        }
        if fields.machine_id.is_some() {
            sets.push(format!("machine_id = ${param_idx}"));
            param_idx += 1;
        }

        let sql = format!(
            "UPDATE licenses SET {} WHERE license_key = ${param_idx}",
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
        let result = sqlx::query("DELETE FROM licenses WHERE license_key = $1")
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
                COUNT(CASE WHEN is_active THEN 1 END) AS active, \
                COUNT(CASE WHEN NOT is_active THEN 1 END) AS revoked, \
                COUNT(CASE WHEN expires_at < $1 THEN 1 END) AS expired, \
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
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO license_logs (license_key, action, machine_id, ip_address, user_agent, timestamp, details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&entry.license_key)
        .bind(entry.action.as_str())
        .bind(&entry.machine_id)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.timestamp)
        .bind(entry.details_text())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "audit entry"))
    }

    async fn list_logs(&self, page: LogPage) -> AppResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM license_logs ORDER BY timestamp DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to list audit entries"))
    }

    async fn find_admin(&self, username: &str) -> AppResult<Option<AdminUser>> {
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, "Failed to find admin user"))
    }

    async fn touch_admin_login(&self, username: &str, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("UPDATE admin_users SET last_login = $1 WHERE username = $2")
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
            "INSERT INTO admin_users (username, password_hash, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (username) DO NOTHING",
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
            .map_err(|e| map_db_error(e, "PostgreSQL health check failed"))?;
        Ok(())
    }
}
