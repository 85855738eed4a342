//! Complaint image ingest: validate a batch, derive variants, store them,
//! record metadata.
//!
//! The whole batch is validated before any processing starts, so a bad
//! file never leaves partial objects behind. Failures after that point
//! undo the batch: rows already inserted are deleted and every stored
//! object is removed, best-effort.

use bytes::Bytes;
use civic_core::error::CoreError;
use civic_core::images::{self, ProcessedImage, Variant, VariantKeys, OUTPUT_MIME_TYPE};
use civic_core::types::DbId;
use civic_db::models::complaint_image::{ComplaintImage, CreateComplaintImage};
use civic_db::repositories::ComplaintImageRepo;
use civic_storage::ObjectStorage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Request body limit for the upload route: three 4 MiB files plus
/// multipart framing.
pub const UPLOAD_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    /// Declared `Content-Type` of the part.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Check file count, declared types and sizes for a whole batch.
pub fn validate_batch(files: &[UploadedFile]) -> Result<(), CoreError> {
    images::validate_file_count(files.len())?;
    for file in files {
        images::validate_upload(file.content_type.as_deref(), file.bytes.len())?;
    }
    Ok(())
}

/// Ingest `files` for `complaint_id`, returning the created metadata rows in
/// upload order. Ownership must already be checked by the caller.
pub async fn ingest_batch(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    complaint_id: DbId,
    files: Vec<UploadedFile>,
) -> AppResult<Vec<ComplaintImage>> {
    validate_batch(&files)?;

    // Not serialized: two concurrent uploads may reuse an index.
    let start_index = ComplaintImageRepo::count_by_complaint(pool, complaint_id).await?;

    let mut undo = BatchUndo::default();
    match store_batch(pool, storage, complaint_id, start_index, files, &mut undo).await {
        Ok(images) => Ok(images),
        Err(e) => {
            undo.run(pool, storage, complaint_id).await;
            Err(e)
        }
    }
}

async fn store_batch(
    pool: &PgPool,
    storage: &dyn ObjectStorage,
    complaint_id: DbId,
    start_index: i64,
    files: Vec<UploadedFile>,
    undo: &mut BatchUndo,
) -> AppResult<Vec<ComplaintImage>> {
    let mut created = Vec::with_capacity(files.len());

    for (offset, file) in files.into_iter().enumerate() {
        let processed = process_off_thread(file.bytes).await?;
        let keys = VariantKeys::new(complaint_id, Uuid::new_v4());

        for variant in Variant::ALL {
            let key = keys.key(variant);
            let body = Bytes::from(processed.variant(variant).bytes.clone());
            storage
                .put_object(key, body, OUTPUT_MIME_TYPE)
                .await
                .map_err(|e| AppError::BadRequest(format!("Upload failed: {e}")))?;
            undo.keys.push(key.to_string());
        }

        let order_index = i32::try_from(start_index + offset as i64)
            .map_err(|_| AppError::InternalError("Image order index overflow".into()))?;

        let image = ComplaintImageRepo::create(
            pool,
            &CreateComplaintImage {
                complaint_id,
                order_index,
                mime_type: OUTPUT_MIME_TYPE.to_string(),
                width: i32::try_from(processed.original.width).ok(),
                height: i32::try_from(processed.original.height).ok(),
                size_bytes: processed.original.bytes.len() as i64,
                path_original: keys.original,
                path_medium: keys.medium,
                path_thumb: keys.thumb,
            },
        )
        .await?;
        undo.image_ids.push(image.id);

        tracing::info!(
            complaint_id,
            image_id = image.id,
            order_index,
            file_name = file.file_name.as_deref().unwrap_or("unknown"),
            "Complaint image stored"
        );
        created.push(image);
    }

    Ok(created)
}

/// Decode and resize on the blocking pool. Any processing failure is the
/// client's problem (undecodable or corrupt input).
async fn process_off_thread(bytes: Bytes) -> AppResult<ProcessedImage> {
    tokio::task::spawn_blocking(move || images::process_image(&bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("Image processing task failed: {e}")))?
        .map_err(|e| match e {
            CoreError::Validation(msg) | CoreError::Internal(msg) => AppError::BadRequest(msg),
            other => AppError::Core(other),
        })
}

/// What a failed batch has written so far.
#[derive(Debug, Default)]
struct BatchUndo {
    keys: Vec<String>,
    image_ids: Vec<DbId>,
}

impl BatchUndo {
    async fn run(self, pool: &PgPool, storage: &dyn ObjectStorage, complaint_id: DbId) {
        if !self.image_ids.is_empty() {
            if let Err(e) = ComplaintImageRepo::delete_many(pool, &self.image_ids).await {
                tracing::warn!(complaint_id, error = %e, "Failed to roll back image rows");
            }
        }
        if !self.keys.is_empty() {
            if let Err(e) = storage.remove_objects(&self.keys).await {
                tracing::warn!(
                    complaint_id,
                    orphaned = self.keys.len(),
                    error = %e,
                    "Failed to roll back stored image objects"
                );
            }
        }
        tracing::info!(
            complaint_id,
            rows = self.image_ids.len(),
            objects = self.keys.len(),
            "Rolled back failed image batch"
        );
    }
}
