//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use keymint_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Always false for errors.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
}

/// Response-side wrapper around the domain error.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, message) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, err.message),
            ErrorKind::Auth => (StatusCode::UNAUTHORIZED, err.message),
            ErrorKind::Expired | ErrorKind::Revoked | ErrorKind::MachineMismatch => {
                (StatusCode::FORBIDDEN, err.message)
            }
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.message),
            ErrorKind::Duplicate => (StatusCode::CONFLICT, err.message),
            ErrorKind::Database | ErrorKind::Configuration | ErrorKind::Internal => {
                // Full detail stays server-side; callers get a generic line.
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ApiErrorBody {
            success: false,
            error: message,
        };

        (status, Json(body)).into_response()
    }
}
