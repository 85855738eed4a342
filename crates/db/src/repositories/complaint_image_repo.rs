//! Repository for the `complaint_images` table.

use civic_core::types::DbId;
use sqlx::PgPool;

use crate::models::complaint_image::{ComplaintImage, CreateComplaintImage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, complaint_id, order_index, mime_type, width, height, size_bytes, \
                       path_original, path_medium, path_thumb, created_at, updated_at";

/// Provides metadata operations for complaint images.
pub struct ComplaintImageRepo;

impl ComplaintImageRepo {
    /// Insert an image row, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateComplaintImage,
    ) -> Result<ComplaintImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO complaint_images
                (complaint_id, order_index, mime_type, width, height, size_bytes,
                 path_original, path_medium, path_thumb)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComplaintImage>(&query)
            .bind(input.complaint_id)
            .bind(input.order_index)
            .bind(&input.mime_type)
            .bind(input.width)
            .bind(input.height)
            .bind(input.size_bytes)
            .bind(&input.path_original)
            .bind(&input.path_medium)
            .bind(&input.path_thumb)
            .fetch_one(pool)
            .await
    }

    /// Find an image by internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ComplaintImage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM complaint_images WHERE id = $1");
        sqlx::query_as::<_, ComplaintImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a complaint's images in display order.
    pub async fn list_by_complaint(
        pool: &PgPool,
        complaint_id: DbId,
    ) -> Result<Vec<ComplaintImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM complaint_images
             WHERE complaint_id = $1
             ORDER BY order_index ASC, id ASC"
        );
        sqlx::query_as::<_, ComplaintImage>(&query)
            .bind(complaint_id)
            .fetch_all(pool)
            .await
    }

    /// Count the images currently stored for a complaint.
    pub async fn count_by_complaint(pool: &PgPool, complaint_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM complaint_images WHERE complaint_id = $1")
            .bind(complaint_id)
            .fetch_one(pool)
            .await
    }

    /// Delete an image row. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM complaint_images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete several image rows at once. Returns the number deleted.
    pub async fn delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM complaint_images WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Every variant storage key of every image on complaints owned by `user_id`.
    pub async fn list_storage_keys_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT i.path_original, i.path_medium, i.path_thumb
             FROM complaint_images i
             JOIN complaints c ON c.id = i.complaint_id
             WHERE c.user_id = $1
             ORDER BY i.id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .flat_map(|(original, medium, thumb)| [original, medium, thumb])
            .collect())
    }
}
