//! `CurrentUser` extractor

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::state::AppState;

/// Validates the bearer token unless `require_auth` already did
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let user = authenticate(&state.jwt, header, parts.uri.path())?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Turn an `Authorization` header into a `CurrentUser`
pub(crate) fn authenticate(
    jwt: &JwtService,
    header: Option<&str>,
    path: &str,
) -> Result<CurrentUser, AppError> {
    let Some(header) = header else {
        tracing::warn!(path = %path, "Missing Authorization header");
        return Err(AppError::not_authenticated());
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    match jwt.validate_token(token) {
        Ok(claims) => CurrentUser::try_from(claims)
            .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}"))),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "JWT validation failed");
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}
