//! Object storage for complaint image variants.
//!
//! - [`ObjectStorage`] -- the seam the API talks to.
//! - [`s3::S3Storage`] -- S3-compatible backend built on `aws-sdk-s3`.
//! - [`memory::MemoryStorage`] -- in-process backend for tests and local runs.
//! - [`config::StorageConfig`] -- environment-driven backend selection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub mod config;
pub mod memory;
pub mod s3;

pub use config::{StorageBackend, StorageConfig};
pub use memory::MemoryStorage;
pub use s3::S3Storage;

/// Errors surfaced by a storage backend.
///
/// `Backend` carries the upstream message verbatim so callers can show it.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),

    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

/// A bucket of objects addressed by string keys.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Name of the bucket this backend writes to.
    fn bucket(&self) -> &str;

    /// Store `body` under `key`, replacing any existing object.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str)
        -> Result<(), StorageError>;

    /// Remove every object in `keys` in one call. Missing keys are not an error.
    async fn remove_objects(&self, keys: &[String]) -> Result<(), StorageError>;

    /// Produce a time-limited URL for reading `key`.
    ///
    /// Fails with [`StorageError::NotFound`] when the object does not exist.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;
}

/// Signed URL for `key`, or `None` when the object is missing or unsignable.
///
/// `None` means "image unavailable" to callers, so failures are only logged.
pub async fn signed_url_or_none(
    storage: &dyn ObjectStorage,
    key: &str,
    expires_in: Duration,
) -> Option<String> {
    match storage.signed_url(key, expires_in).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!(key, error = %e, "Signed URL unavailable");
            None
        }
    }
}

/// Build the backend selected by `config`.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    match config.backend {
        StorageBackend::S3 => Ok(Arc::new(S3Storage::from_config(config).await?)),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage; uploads are lost on restart");
            Ok(Arc::new(MemoryStorage::new(&config.bucket)))
        }
    }
}
