//! Repository for the `complaints` table.

use civic_core::types::DbId;
use sqlx::PgPool;

use crate::models::complaint::{Complaint, CreateComplaint};

const COLUMNS: &str = "id, user_id, title, description, created_at, updated_at";

/// Ownership lookups for complaints.
pub struct ComplaintRepo;

impl ComplaintRepo {
    /// Insert a new complaint, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateComplaint) -> Result<Complaint, sqlx::Error> {
        let query = format!(
            "INSERT INTO complaints (user_id, title, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Complaint>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a complaint by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Complaint>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM complaints WHERE id = $1");
        sqlx::query_as::<_, Complaint>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Return the owning user's id, or `None` if the complaint does not exist.
    pub async fn find_owner_id(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT user_id FROM complaints WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
