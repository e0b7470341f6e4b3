//! # keymint-entity
//!
//! Domain entity models shared by the store, engine, auth, and API crates.

pub mod admin;
pub mod audit;
pub mod license;

pub use admin::model::AdminUser;
pub use audit::action::AuditAction;
pub use audit::model::{AuditLogEntry, NewAuditEntry};
pub use license::model::{License, LicenseState, LicenseStats, LicenseUpdate, NewLicense};
