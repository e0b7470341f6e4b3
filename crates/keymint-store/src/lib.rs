//! # keymint-store
//!
//! The persistence contract for the license lifecycle engine and its three
//! interchangeable storage engines: embedded SQLite, PostgreSQL, and MySQL.
//!
//! All engines implement the [`LicenseStore`] trait with identical
//! behavior; engine differences (placeholder syntax, boolean encoding,
//! id generation, affected-row conventions) are normalized inside each
//! implementation so callers never observe them.

pub mod backend;
pub mod mysql;
pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use backend::{LicenseStore, connect};
pub use mysql::MysqlStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
