//! Complaint image metadata model and DTOs.

use civic_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `complaint_images` table.
///
/// `width`, `height` and `size_bytes` describe the "original" variant
/// after resizing, not the uploaded file.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintImage {
    pub id: DbId,
    pub complaint_id: DbId,
    pub order_index: i32,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size_bytes: i64,
    pub path_original: String,
    pub path_medium: String,
    pub path_thumb: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ComplaintImage {
    /// Storage keys of all three variants.
    pub fn storage_keys(&self) -> Vec<String> {
        vec![
            self.path_original.clone(),
            self.path_medium.clone(),
            self.path_thumb.clone(),
        ]
    }
}

/// DTO for inserting image metadata after its variants are stored.
#[derive(Debug, Clone)]
pub struct CreateComplaintImage {
    pub complaint_id: DbId,
    pub order_index: i32,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub size_bytes: i64,
    pub path_original: String,
    pub path_medium: String,
    pub path_thumb: String,
}
