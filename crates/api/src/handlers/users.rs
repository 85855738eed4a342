//! Handlers for the caller's own account (`/users`).

use axum::extract::State;
use axum::Json;
use civic_core::accounts::normalize_name;
use civic_core::error::CoreError;
use civic_db::models::user::UserResponse;
use civic_db::repositories::{ComplaintImageRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `PATCH /users/profile`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: &'static str,
}

/// PATCH /users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let name = normalize_name(&input.name)?;

    let user = UserRepo::update_name(&state.pool, auth.user_id, &name)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;

    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /users/account
///
/// Deletes the user; complaints and image rows cascade in the database.
/// Stored image objects are removed afterwards, best-effort.
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DeleteAccountResponse>> {
    let keys = ComplaintImageRepo::list_storage_keys_for_user(&state.pool, auth.user_id).await?;

    if !UserRepo::delete(&state.pool, auth.user_id).await? {
        return Err(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }
        .into());
    }

    if !keys.is_empty() {
        if let Err(e) = state.storage.remove_objects(&keys).await {
            tracing::warn!(
                user_id = auth.user_id,
                orphaned = keys.len(),
                error = %e,
                "Failed to remove image objects of deleted account"
            );
        }
    }

    tracing::info!(user_id = auth.user_id, objects = keys.len(), "Account deleted");
    Ok(Json(DeleteAccountResponse {
        success: true,
        message: "Account deleted successfully",
    }))
}
