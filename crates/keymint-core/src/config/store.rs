//! Persistence backend configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which storage engine backs the persistence contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded single-file SQLite engine.
    Sqlite,
    /// PostgreSQL over a connection pool.
    Postgres,
    /// MySQL over a connection pool.
    Mysql,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgres"),
            Self::Mysql => write!(f, "mysql"),
        }
    }
}

/// Storage engine selection and connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend engine to use.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Connection URL (`sqlite://...`, `postgres://...`, `mysql://...`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum number of connections in the pool (network engines only;
    /// the SQLite engine always runs a single writer connection).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
        }
    }
}

fn default_backend() -> BackendKind {
    BackendKind::Sqlite
}

fn default_url() -> String {
    "sqlite://data/licenses.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_deserializes_lowercase() {
        let kind: BackendKind = serde_json::from_str("\"postgres\"").expect("deserialize");
        assert_eq!(kind, BackendKind::Postgres);
        assert_eq!(kind.to_string(), "postgres");
    }
}
