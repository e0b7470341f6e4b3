//! Route definitions for the Keymint HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use keymint_core::config::server::ServerConfig;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(license_routes())
        .merge(admin_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server);
    let timeout = TimeoutLayer::new(Duration::from_secs(
        state.config.server.request_timeout_seconds,
    ));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .with_state(state)
}

/// Public license endpoints.
fn license_routes() -> Router<AppState> {
    Router::new()
        .route("/licenses/validate", post(handlers::licenses::validate))
        .route("/licenses/create", post(handlers::licenses::create))
        .route("/licenses/info/{key}", get(handlers::licenses::info))
        .route("/licenses/revoke", post(handlers::licenses::revoke))
        .route("/licenses/stats", get(handlers::licenses::stats))
}

/// Token-guarded admin endpoints plus login.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(handlers::admin::login))
        .route("/admin/licenses", get(handlers::admin::list_licenses))
        .route("/admin/licenses", post(handlers::admin::create_license))
        .route(
            "/admin/licenses/revoke",
            post(handlers::admin::revoke_license),
        )
        .route(
            "/admin/licenses/{key}",
            put(handlers::admin::update_license),
        )
        .route(
            "/admin/licenses/{key}",
            delete(handlers::admin::delete_license),
        )
        .route("/admin/stats", get(handlers::admin::stats))
        .route("/admin/logs", get(handlers::admin::logs))
}

/// Liveness endpoint.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// CORS layer from configuration; `*` means any origin.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
