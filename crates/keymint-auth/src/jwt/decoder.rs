//! Session token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use keymint_core::config::auth::AuthConfig;
use keymint_core::error::AppError;

use super::claims::AdminClaims;

/// Validates admin session tokens against the shared server secret.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    ///
    /// Any failure (bad signature, expired, malformed) yields an auth
    /// error; claims are never returned partially.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, AppError> {
        let token_data =
            decode::<AdminClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::auth("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::auth("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::auth("Invalid token signature")
                    }
                    _ => AppError::auth(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}
