//! Public license endpoints — validate, create, info, revoke, stats.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use keymint_core::error::AppError;
use keymint_engine::IssueLicense;

use crate::dto::request::{CreateLicenseRequest, RevokeRequest, ValidateRequest};
use crate::dto::response::{
    LicenseResponse, MessageResponse, StatsResponse, ValidateResponse,
};
use crate::error::ApiError;
use crate::extractors::ClientMeta;
use crate::state::AppState;

/// POST /api/licenses/validate
pub async fn validate(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let validated = state
        .engine
        .validate(&req.license_key, req.machine_id.as_deref(), &meta)
        .await?;

    Ok(Json(ValidateResponse {
        success: true,
        license: validated.license.into(),
        machine_id: validated.machine_id,
    }))
}

/// POST /api/licenses/create
pub async fn create(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<CreateLicenseRequest>,
) -> Result<Json<LicenseResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let license = state
        .licenses
        .issue(
            IssueLicense {
                user_email: req.user_email,
                user_name: req.user_name,
                duration_days: req.duration_days,
                notes: req.notes,
            },
            None,
            &meta,
        )
        .await?;

    Ok(Json(LicenseResponse {
        success: true,
        license: license.into(),
    }))
}

/// GET /api/licenses/info/{key}
pub async fn info(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let license = state.licenses.info(&key).await?;

    Ok(Json(LicenseResponse {
        success: true,
        license: license.into(),
    }))
}

/// POST /api/licenses/revoke
pub async fn revoke(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    state.licenses.revoke(&req.license_key, None, &meta).await?;

    Ok(Json(MessageResponse::ok("License revoked successfully")))
}

/// GET /api/licenses/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.licenses.stats().await?;

    Ok(Json(StatsResponse {
        success: true,
        stats: stats.into(),
    }))
}
