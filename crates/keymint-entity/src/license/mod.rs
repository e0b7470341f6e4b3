//! License entity.

pub mod model;

pub use model::{License, LicenseState, LicenseStats, LicenseUpdate, NewLicense};
