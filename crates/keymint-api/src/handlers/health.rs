//! Liveness endpoint.

use axum::Json;
use axum::extract::State;

use crate::dto::response::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.store.health_check().await?;

    Ok(Json(HealthResponse {
        success: true,
        status: "ok".to_string(),
        backend: state.config.store.backend.to_string(),
    }))
}
