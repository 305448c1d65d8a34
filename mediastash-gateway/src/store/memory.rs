//! In-memory store backend

use super::traits::*;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use md5::{Digest, Md5};
use std::time::Duration;

/// Base of the fabricated URLs handed out by `presign_get`.
const PRESIGN_BASE: &str = "https://stash.test";

/// In-memory stored object
struct MemoryObject {
    body: Bytes,
    metadata: ObjectMetadata,
    last_modified: DateTime<Utc>,
}

/// In-memory store backed by a concurrent map
///
/// Objects live for the lifetime of the process. Serves as the test
/// double for [`ObjectStore`] and for embedding the gateway without a
/// remote store.
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<String, MemoryObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes stored under `key`, if any
    pub fn object_body(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|object| object.body.clone())
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn fake_signature(key: &str, expires_in: Duration) -> String {
        let mut hasher = Md5::new();
        hasher.update(key.as_bytes());
        hasher.update(expires_in.as_secs().to_be_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        metadata: ObjectMetadata,
    ) -> Result<(), StoreError> {
        self.objects.insert(
            key.to_string(),
            MemoryObject {
                body,
                metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn stat_object(&self, key: &str) -> Result<ObjectStat, StoreError> {
        let object = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))?;
        Ok(ObjectStat {
            content_type: object.metadata.content_type.clone(),
            size: Some(object.body.len() as u64),
            last_modified: Some(object.last_modified),
            user_metadata: object.metadata.user_metadata.clone(),
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        // Removing an absent key succeeds, matching S3 delete semantics.
        self.objects.remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StoreError> {
        // Signing is pure computation; the key does not have to exist.
        let signature = Self::fake_signature(key, expires_in);
        Ok(format!(
            "{PRESIGN_BASE}/{key}?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Expires={}&X-Amz-Signature={signature}",
            expires_in.as_secs()
        ))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
