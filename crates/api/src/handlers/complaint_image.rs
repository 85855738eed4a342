//! Handlers for images attached to a complaint
//! (`/complaints/{complaint_id}/images`).

use axum::extract::{Multipart, Path, State};
use axum::Json;
use civic_core::error::CoreError;
use civic_core::images::MAX_FILES_PER_UPLOAD;
use civic_core::types::DbId;
use civic_db::models::complaint::Complaint;
use civic_db::models::complaint_image::ComplaintImage;
use civic_db::repositories::{ComplaintImageRepo, ComplaintRepo};
use civic_storage::signed_url_or_none;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::ingest::{ingest_batch, UploadedFile};
use crate::middleware::auth::AuthUser;
use crate::middleware::ownership::require_owner;
use crate::state::AppState;

/// Multipart field name carrying the image files.
pub const FILES_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub images: Vec<ComplaintImage>,
}

#[derive(Debug, Serialize)]
pub struct DeleteImageResponse {
    pub success: bool,
}

/// Image metadata plus short-lived read URLs. A URL is `null` when its
/// object is missing from storage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedComplaintImage {
    #[serde(flatten)]
    pub image: ComplaintImage,
    pub signed_thumb_url: Option<String>,
    pub signed_medium_url: Option<String>,
    pub signed_original_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub images: Vec<SignedComplaintImage>,
}

/// POST /complaints/{complaint_id}/images/upload
///
/// Accepts up to three files in the `files` field. The batch succeeds or
/// fails as a whole.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(complaint_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    require_owner::<Complaint>(&state.pool, complaint_id, auth.user_id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        if files.len() == MAX_FILES_PER_UPLOAD {
            return Err(CoreError::Validation(format!(
                "Maximum {MAX_FILES_PER_UPLOAD} images allowed"
            ))
            .into());
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        files.push(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    let images = ingest_batch(&state.pool, state.storage.as_ref(), complaint_id, files).await?;

    tracing::info!(
        complaint_id,
        user_id = auth.user_id,
        count = images.len(),
        "Complaint images uploaded"
    );
    Ok(Json(UploadResponse { images }))
}

/// DELETE /complaints/{complaint_id}/images/{image_id}
///
/// Objects are removed before the row, so a storage failure leaves the
/// metadata intact and the delete can be retried.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((complaint_id, image_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DeleteImageResponse>> {
    require_owner::<Complaint>(&state.pool, complaint_id, auth.user_id).await?;

    let image = ComplaintImageRepo::find_by_id(&state.pool, image_id)
        .await?
        .filter(|image| image.complaint_id == complaint_id)
        .ok_or(CoreError::NotFound {
            entity: "ComplaintImage",
            id: image_id,
        })?;

    state
        .storage
        .remove_objects(&image.storage_keys())
        .await
        .map_err(|e| AppError::BadRequest(format!("Deletion failed: {e}")))?;

    ComplaintImageRepo::delete(&state.pool, image.id).await?;

    tracing::info!(complaint_id, image_id, user_id = auth.user_id, "Complaint image deleted");
    Ok(Json(DeleteImageResponse { success: true }))
}

/// GET /complaints/{complaint_id}/images
///
/// Public listing in display order, with signed URLs for each variant.
pub async fn list(
    State(state): State<AppState>,
    Path(complaint_id): Path<DbId>,
) -> AppResult<Json<ImageListResponse>> {
    if ComplaintRepo::find_by_id(&state.pool, complaint_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "Complaint",
            id: complaint_id,
        }
        .into());
    }

    let rows = ComplaintImageRepo::list_by_complaint(&state.pool, complaint_id).await?;
    let ttl = state.config.storage.signed_url_ttl();
    let storage = state.storage.as_ref();

    let mut images = Vec::with_capacity(rows.len());
    for image in rows {
        images.push(SignedComplaintImage {
            signed_thumb_url: signed_url_or_none(storage, &image.path_thumb, ttl).await,
            signed_medium_url: signed_url_or_none(storage, &image.path_medium, ttl).await,
            signed_original_url: signed_url_or_none(storage, &image.path_original, ttl).await,
            image,
        });
    }

    Ok(Json(ImageListResponse { images }))
}
