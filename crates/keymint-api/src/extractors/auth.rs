//! `AdminAuth` extractor — pulls the session token from the Authorization
//! header and validates it before any domain logic runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use keymint_auth::AdminClaims;
use keymint_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Verified admin identity available in handlers.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub AdminClaims);

impl AdminAuth {
    /// Username of the acting admin.
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError(AppError::auth("Authentication token required")))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError(AppError::auth("Invalid Authorization header format")))?;

        let claims = state.authenticator.verify(token)?;
        Ok(AdminAuth(claims))
    }
}
