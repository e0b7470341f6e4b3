//! Admin endpoints. Everything except login requires a valid session
//! token; the token is checked before any domain logic executes.

use axum::Json;
use axum::extract::{Path, Query, State};
use validator::Validate;

use keymint_core::error::AppError;
use keymint_core::types::pagination::LogPage;
use keymint_engine::IssueLicense;

use crate::dto::request::{
    CreateLicenseRequest, LoginRequest, LogsQuery, RevokeRequest, UpdateLicenseRequest,
};
use crate::dto::response::{
    AdminSummary, LicenseListResponse, LicenseResponse, LoginResponse, LogsResponse,
    MessageResponse, StatsResponse,
};
use crate::error::ApiError;
use crate::extractors::{AdminAuth, ClientMeta};
use crate::state::AppState;

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let session = state
        .authenticator
        .login(&req.username, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at,
        admin: AdminSummary {
            username: session.username,
            last_login: session.last_login,
        },
    }))
}

/// GET /api/admin/licenses
pub async fn list_licenses(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<LicenseListResponse>, ApiError> {
    let licenses = state.licenses.list().await?;

    Ok(Json(LicenseListResponse {
        success: true,
        licenses: licenses.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/admin/licenses
pub async fn create_license(
    State(state): State<AppState>,
    admin: AdminAuth,
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
            Some(admin.username()),
            &meta,
        )
        .await?;

    Ok(Json(LicenseResponse {
        success: true,
        license: license.into(),
    }))
}

/// PUT /api/admin/licenses/{key}
pub async fn update_license(
    State(state): State<AppState>,
    admin: AdminAuth,
    ClientMeta(meta): ClientMeta,
    Path(key): Path<String>,
    Json(req): Json<UpdateLicenseRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .licenses
        .update(&key, req.into(), admin.username(), &meta)
        .await?;

    Ok(Json(MessageResponse::ok("License updated successfully")))
}

/// DELETE /api/admin/licenses/{key}
pub async fn delete_license(
    State(state): State<AppState>,
    admin: AdminAuth,
    ClientMeta(meta): ClientMeta,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .licenses
        .delete(&key, admin.username(), &meta)
        .await?;

    Ok(Json(MessageResponse::ok("License deleted successfully")))
}

/// POST /api/admin/licenses/revoke
pub async fn revoke_license(
    State(state): State<AppState>,
    admin: AdminAuth,
    ClientMeta(meta): ClientMeta,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    state
        .licenses
        .revoke(&req.license_key, Some(admin.username()), &meta)
        .await?;

    Ok(Json(MessageResponse::ok("License revoked successfully")))
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.licenses.stats().await?;

    Ok(Json(StatsResponse {
        success: true,
        stats: stats.into(),
    }))
}

/// GET /api/admin/logs
pub async fn logs(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let page = LogPage::new(
        query.limit.unwrap_or(LogPage::default().limit),
        query.offset.unwrap_or(0),
    );
    let logs = state.audit.list(page).await?;

    Ok(Json(LogsResponse {
        success: true,
        logs,
    }))
}
