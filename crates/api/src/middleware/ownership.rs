//! Resource ownership checks.
//!
//! A resource the caller does not own is reported exactly like a resource
//! that does not exist, so ids of other users' data cannot be probed.

use std::future::Future;

use civic_core::error::CoreError;
use civic_core::types::DbId;
use civic_db::models::complaint::Complaint;
use civic_db::repositories::ComplaintRepo;
use sqlx::PgPool;

use crate::error::AppResult;

/// A table whose rows belong to a single user.
pub trait OwnedResource {
    /// Entity name used in not-found errors.
    const ENTITY: &'static str;

    /// Owner of row `id`, or `None` when the row does not exist.
    fn owner_id(pool: &PgPool, id: DbId)
        -> impl Future<Output = Result<Option<DbId>, sqlx::Error>> + Send;
}

impl OwnedResource for Complaint {
    const ENTITY: &'static str = "Complaint";

    async fn owner_id(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        ComplaintRepo::find_owner_id(pool, id).await
    }
}

/// Whether `caller` owns resource `id`. A missing resource is not owned.
pub async fn is_owner<R: OwnedResource>(
    pool: &PgPool,
    id: DbId,
    caller: DbId,
) -> Result<bool, sqlx::Error> {
    Ok(R::owner_id(pool, id).await? == Some(caller))
}

/// Fail with `NotFound` unless `caller` owns resource `id`.
pub async fn require_owner<R: OwnedResource>(
    pool: &PgPool,
    id: DbId,
    caller: DbId,
) -> AppResult<()> {
    if is_owner::<R>(pool, id, caller).await? {
        Ok(())
    } else {
        tracing::debug!(entity = R::ENTITY, id, caller, "Ownership check failed");
        Err(CoreError::NotFound {
            entity: R::ENTITY,
            id,
        }
        .into())
    }
}
