pub mod auth;
pub mod complaint_image;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree (mounted at the root).
///
/// ```text
/// /auth/signup                                  signup (public)
/// /auth/login                                   login (public)
/// /auth/logout                                  logout (public)
/// /auth/refresh                                 refresh (refresh token)
/// /auth/change-password                         change password (auth)
///
/// /users/profile                                update profile (auth)
/// /users/account                                delete account (auth)
///
/// /complaints/{complaint_id}/images             list (public)
/// /complaints/{complaint_id}/images/upload      upload (owner, multipart)
/// /complaints/{complaint_id}/images/{image_id}  delete (owner)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest(
            "/complaints/{complaint_id}/images",
            complaint_image::router(),
        )
}
