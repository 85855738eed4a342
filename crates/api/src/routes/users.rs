//! Route definitions for the `/users` resource.

use axum::routing::{delete, patch};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`. All require auth.
///
/// ```text
/// PATCH  /profile  -> update_profile
/// DELETE /account  -> delete_account
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", patch(users::update_profile))
        .route("/account", delete(users::delete_account))
}
