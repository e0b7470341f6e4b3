//! # keymint-api
//!
//! HTTP API layer for Keymint built on Axum.
//!
//! Provides the public validation endpoints, the token-guarded admin
//! surface, extractors, DTOs, and error mapping. All domain logic lives
//! in `keymint-engine`; this crate is transport plumbing.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
