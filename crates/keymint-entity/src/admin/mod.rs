//! Admin user entity.

pub mod model;

pub use model::AdminUser;
