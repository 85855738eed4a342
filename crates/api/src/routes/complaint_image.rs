//! Route definitions for `/complaints/{complaint_id}/images`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::complaint_image;
use crate::ingest::UPLOAD_BODY_LIMIT_BYTES;
use crate::state::AppState;

/// Routes mounted at `/complaints/{complaint_id}/images`.
///
/// ```text
/// GET    /            -> list (public)
/// POST   /upload      -> upload (owner, multipart, 16 MiB body limit)
/// DELETE /{image_id}  -> delete (owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(complaint_image::list))
        .route(
            "/upload",
            post(complaint_image::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT_BYTES)),
        )
        .route("/{image_id}", delete(complaint_image::delete))
}
