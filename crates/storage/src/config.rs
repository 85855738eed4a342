use std::time::Duration;

/// Default bucket for complaint images.
pub const DEFAULT_BUCKET: &str = "complaint-images";

/// Default signed-URL validity in seconds (1 hour).
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Which [`ObjectStorage`](crate::ObjectStorage) implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

impl StorageBackend {
    /// Parse the `STORAGE_BACKEND` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "s3" => Some(Self::S3),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Custom S3-compatible endpoint (MinIO, R2, ...). `None` uses AWS.
    pub endpoint: Option<String>,
    pub region: String,
    /// Static credentials. When either is missing the default AWS chain is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: String,
    pub signed_url_ttl_secs: u64,
}

impl StorageConfig {
    /// Load storage configuration from environment variables.
    ///
    /// | Env Var                       | Default            |
    /// |-------------------------------|--------------------|
    /// | `STORAGE_BACKEND`             | `s3`               |
    /// | `STORAGE_ENDPOINT`            | --                 |
    /// | `STORAGE_REGION`              | `us-east-1`        |
    /// | `STORAGE_ACCESS_KEY_ID`       | --                 |
    /// | `STORAGE_SECRET_ACCESS_KEY`   | --                 |
    /// | `STORAGE_BUCKET`              | `complaint-images` |
    /// | `STORAGE_SIGNED_URL_TTL_SECS` | `3600`             |
    ///
    /// # Panics
    ///
    /// Panics on an unknown backend name or a non-numeric TTL.
    pub fn from_env() -> Self {
        let backend_name = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "s3".into());
        let backend = StorageBackend::from_name(&backend_name)
            .unwrap_or_else(|| panic!("STORAGE_BACKEND must be 's3' or 'memory', got '{backend_name}'"));

        let signed_url_ttl_secs: u64 = std::env::var("STORAGE_SIGNED_URL_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
            .parse()
            .expect("STORAGE_SIGNED_URL_TTL_SECS must be a valid u64");

        Self {
            backend,
            endpoint: non_empty_var("STORAGE_ENDPOINT"),
            region: non_empty_var("STORAGE_REGION").unwrap_or_else(|| "us-east-1".into()),
            access_key_id: non_empty_var("STORAGE_ACCESS_KEY_ID"),
            secret_access_key: non_empty_var("STORAGE_SECRET_ACCESS_KEY"),
            bucket: non_empty_var("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.into()),
            signed_url_ttl_secs,
        }
    }

    /// In-memory configuration with defaults, for tests and local runs.
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            endpoint: None,
            region: "us-east-1".into(),
            access_key_id: None,
            secret_access_key: None,
            bucket: DEFAULT_BUCKET.into(),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }

    /// Signed-URL validity as a [`Duration`].
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!(StorageBackend::from_name("s3"), Some(StorageBackend::S3));
        assert_eq!(StorageBackend::from_name(" Memory "), Some(StorageBackend::Memory));
        assert_eq!(StorageBackend::from_name("gcs"), None);
    }

    #[test]
    fn in_memory_defaults() {
        let config = StorageConfig::in_memory();
        assert_eq!(config.bucket, "complaint-images");
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(3600));
    }
}
