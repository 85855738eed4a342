//! Domain error type shared by every crate in the workspace.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity does not exist, or exists but belongs to someone else.
    /// Ownership checks use this variant for both cases.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed input rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The single message used for every token verification failure.
    pub fn invalid_token() -> Self {
        Self::Unauthorized("Invalid or expired token".into())
    }

    /// Shorthand for a failed `validator` check or hand-rolled rule.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
