//! Complaint entity model.
//!
//! Complaint CRUD lives outside this service; the row is read here for
//! ownership checks and created directly only by tests and tooling.

use civic_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `complaints` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a complaint.
#[derive(Debug)]
pub struct CreateComplaint {
    pub user_id: DbId,
    pub title: String,
    pub description: String,
}
