//! Handlers for the `/auth` resource (signup, login, logout, refresh,
//! change-password).
//!
//! Successful signup, login and refresh both return the token pair in the
//! body and set it as HttpOnly cookies.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use civic_core::accounts::{normalize_email, normalize_name};
use civic_core::error::CoreError;
use civic_core::types::DbId;
use civic_db::models::user::{CreateUser, UserResponse};
use civic_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::cookies::{clear_auth_cookies, set_auth_cookies};
use crate::auth::jwt::{issue_token_pair, TokenPair};
use crate::auth::password::{hash_for_storage, matches_stored_hash};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::auth::{AuthUser, RefreshUser};
use crate::state::AppState;

const EMAIL_TAKEN: &str = "Email already registered";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    pub name: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters long"))]
    pub new_password: String,
}

/// Body returned by signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/signup
///
/// Create an account and sign it in.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut input): Json<SignupRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    input.email = normalize_email(&input.email);
    input.validate()?;
    let name = normalize_name(&input.name)?;

    if UserRepo::find_by_email(&state.pool, &input.email).await?.is_some() {
        return Err(CoreError::validation(EMAIL_TAKEN).into());
    }

    let password_hash = hash_for_storage(&input.password)?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email,
            name,
            password_hash,
        },
    )
    .await
    .map_err(|e| {
        // Lost a race with a concurrent signup for the same email.
        if is_unique_violation(&e, "uq_users_email") {
            AppError::Core(CoreError::validation(EMAIL_TAKEN))
        } else {
            AppError::Database(e)
        }
    })?;

    let tokens = issue_tokens(&state, user.id, &user.email)?;
    tracing::info!(user_id = user.id, "User signed up");

    let jar = set_auth_cookies(jar, &tokens, state.config.production);
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            user: UserResponse::from(&user),
            tokens,
        }),
    ))
}

/// POST /auth/login
///
/// Unknown email and wrong password produce the same error.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut input): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    input.email = normalize_email(&input.email);
    input.validate()?;

    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(|| CoreError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !matches_stored_hash(&input.password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()).into());
    }

    let tokens = issue_tokens(&state, user.id, &user.email)?;
    tracing::info!(user_id = user.id, "User logged in");

    let jar = set_auth_cookies(jar, &tokens, state.config.production);
    Ok((
        jar,
        Json(AuthResponse {
            user: UserResponse::from(&user),
            tokens,
        }),
    ))
}

/// POST /auth/logout
///
/// Stateless: tokens stay valid until they expire. Only the cookies go.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (StatusCode, CookieJar) {
    (
        StatusCode::NO_CONTENT,
        clear_auth_cookies(jar, state.config.production),
    )
}

/// GET /auth/refresh
///
/// Exchange a valid refresh token for a new pair. The old refresh token is
/// not revoked.
pub async fn refresh(
    State(state): State<AppState>,
    caller: RefreshUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<TokenPair>)> {
    let tokens = issue_tokens(&state, caller.user_id, &caller.email)?;
    tracing::debug!(user_id = caller.user_id, "Tokens refreshed");

    let jar = set_auth_cookies(jar, &tokens, state.config.production);
    Ok((jar, Json(tokens)))
}

/// POST /auth/change-password
///
/// The current password is checked before the new one is validated.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("User not found".into()))?;

    if !matches_stored_hash(&input.current_password, &user.password_hash)? {
        return Err(CoreError::Unauthorized("Current password is incorrect".into()).into());
    }

    input.validate()?;

    let password_hash = hash_for_storage(&input.new_password)?;
    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;
    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password changed successfully",
    }))
}

fn issue_tokens(state: &AppState, user_id: DbId, email: &str) -> AppResult<TokenPair> {
    issue_token_pair(user_id, email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}
