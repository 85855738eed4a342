//! In-process backend.
//!
//! Used by integration tests (which inspect what was written) and by
//! `STORAGE_BACKEND=memory` for local development without S3. Failures
//! can be injected to exercise error paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{ObjectStorage, StorageError};

/// One stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// Object storage held in a map.
#[derive(Debug)]
pub struct MemoryStorage {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    /// Successful puts allowed before every further put fails.
    put_budget: AtomicUsize,
    puts: AtomicUsize,
    fail_removals: AtomicBool,
}

impl MemoryStorage {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: RwLock::new(BTreeMap::new()),
            put_budget: AtomicUsize::new(usize::MAX),
            puts: AtomicUsize::new(0),
            fail_removals: AtomicBool::new(false),
        }
    }

    /// Let `count` more puts succeed, then fail every later one.
    pub fn fail_puts_after(&self, count: usize) {
        let already = self.puts.load(Ordering::SeqCst);
        self.put_budget
            .store(already.saturating_add(count), Ordering::SeqCst);
    }

    /// Make every `remove_objects` call fail (or succeed again).
    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// All stored keys in lexical order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let attempt = self.puts.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.put_budget.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!(
                "simulated upload failure for '{key}'"
            )));
        }

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove_objects(&self, keys: &[String]) -> Result<(), StorageError> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("simulated delete failure".into()));
        }
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        if !self.objects.read().await.contains_key(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let expires_at = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        Ok(format!(
            "memory://{}/{key}?expires={expires_at}",
            self.bucket
        ))
    }
}
