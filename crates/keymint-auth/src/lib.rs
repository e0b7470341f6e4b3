//! # keymint-auth
//!
//! Admin authentication for Keymint: Argon2id password hashing with
//! configurable cost, HS256 session tokens, and the [`AdminAuthenticator`]
//! that ties both to the persisted admin account.

pub mod authenticator;
pub mod jwt;
pub mod password;

pub use authenticator::{AdminAuthenticator, AdminSession};
pub use jwt::claims::AdminClaims;
pub use password::hasher::PasswordHasher;
