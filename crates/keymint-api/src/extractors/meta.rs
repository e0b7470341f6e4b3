//! `ClientMeta` extractor — client IP and User-Agent for audit entries.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use keymint_engine::RequestMeta;

use crate::error::ApiError;
use crate::state::AppState;

/// Request metadata captured for the audit trail.
#[derive(Debug, Clone)]
pub struct ClientMeta(pub RequestMeta);

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());

        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(ClientMeta(RequestMeta::new(ip_address, user_agent)))
    }
}
