//! JWT-based authentication extractors for Axum handlers.
//!
//! A token is read from its cookie first and from an
//! `Authorization: Bearer` header second. When the cookie is present it wins,
//! even if it turns out to be invalid.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use civic_core::error::CoreError;
use civic_core::types::DbId;

use crate::auth::cookies::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::jwt::{verify_access_token, verify_refresh_token};
use crate::error::AppError;
use crate::state::AppState;

/// Caller authenticated by a valid access token.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub email: String,
}

/// Caller presenting a valid refresh token. Only `GET /auth/refresh` uses this.
#[derive(Debug, Clone)]
pub struct RefreshUser {
    pub user_id: DbId,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, ACCESS_COOKIE).ok_or_else(missing_token)?;
        let claims = verify_access_token(&token, &state.config.jwt)?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, REFRESH_COOKIE).ok_or_else(missing_token)?;
        let claims = verify_refresh_token(&token, &state.config.jwt)?;

        Ok(RefreshUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

fn missing_token() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Missing authentication token".into(),
    ))
}

/// Token from the `cookie_name` cookie, falling back to a Bearer header.
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
