//! Table definitions per storage engine.
//!
//! Each engine creates the same three tables with engine-native column
//! types. Timestamp columns hold caller-supplied UTC instants; none of
//! the DDL uses an engine clock default.

/// SQLite schema. Timestamps are TEXT, booleans INTEGER.
pub const SQLITE: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS licenses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        license_key TEXT NOT NULL UNIQUE,
        machine_id TEXT,
        user_email TEXT NOT NULL,
        user_name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        last_used TEXT,
        usage_count INTEGER NOT NULL DEFAULT 0,
        notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS admin_users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        last_login TEXT
    )",
    "CREATE TABLE IF NOT EXISTS license_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        license_key TEXT NOT NULL,
        action TEXT NOT NULL,
        machine_id TEXT,
        ip_address TEXT,
        user_agent TEXT,
        timestamp TEXT NOT NULL,
        details TEXT
    )",
];

/// PostgreSQL schema. BIGSERIAL ids, TIMESTAMPTZ timestamps.
pub const POSTGRES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS licenses (
        id BIGSERIAL PRIMARY KEY,
        license_key VARCHAR(255) NOT NULL UNIQUE,
        machine_id VARCHAR(255),
        user_email VARCHAR(255) NOT NULL,
        user_name VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        last_used TIMESTAMPTZ,
        usage_count BIGINT NOT NULL DEFAULT 0,
        notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS admin_users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        last_login TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS license_logs (
        id BIGSERIAL PRIMARY KEY,
        license_key VARCHAR(255) NOT NULL,
        action VARCHAR(64) NOT NULL,
        machine_id VARCHAR(255),
        ip_address VARCHAR(255),
        user_agent TEXT,
        timestamp TIMESTAMPTZ NOT NULL,
        details TEXT
    )",
];

/// MySQL schema. BIGINT AUTO_INCREMENT ids, DATETIME(6) timestamps
/// (DATETIME rather than TIMESTAMP to avoid the 2038 range limit on
/// long-dated expiries).
pub const MYSQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS licenses (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        license_key VARCHAR(255) NOT NULL UNIQUE,
        machine_id VARCHAR(255),
        user_email VARCHAR(255) NOT NULL,
        user_name VARCHAR(255) NOT NULL,
        created_at DATETIME(6) NOT NULL,
        expires_at DATETIME(6) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        last_used DATETIME(6),
        usage_count BIGINT NOT NULL DEFAULT 0,
        notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS admin_users (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created_at DATETIME(6) NOT NULL,
        last_login DATETIME(6)
    )",
    "CREATE TABLE IF NOT EXISTS license_logs (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        license_key VARCHAR(255) NOT NULL,
        action VARCHAR(64) NOT NULL,
        machine_id VARCHAR(255),
        ip_address VARCHAR(255),
        user_agent TEXT,
        timestamp DATETIME(6) NOT NULL,
        details TEXT
    )",
];
