//! Object store traits

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Boxed transport error carried as the cause of a failed request.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from store operations
///
/// `NoSuchKey` is kept separate from `Request` so callers can tell an
/// absent object from a failed round trip, even where they choose to
/// treat both the same way.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No object at key: {0}")]
    NoSuchKey(String),

    #[error("Store request {op} failed for {key}")]
    Request {
        op: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Wrap a transport error as a failed `op` on `key`
    pub fn request(op: &'static str, key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Request {
            op,
            key: key.into(),
            source: source.into(),
        }
    }
}

/// Metadata attached to an object at write time
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub user_metadata: HashMap<String, String>,
}

/// Stored-object view returned by a stat
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub user_metadata: HashMap<String, String>,
}

/// Abstract bucket-scoped object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        metadata: ObjectMetadata,
    ) -> Result<(), StoreError>;

    /// Fetch the metadata view of the object at `key`
    async fn stat_object(&self, key: &str) -> Result<ObjectStat, StoreError>;

    /// Delete the object at `key`; deleting an absent key succeeds
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;

    /// Produce a pre-signed GET URL for `key`, valid for `expires_in`
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StoreError>;

    /// List keys beginning with `prefix`
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Probe the backing bucket for reachability
    async fn health_check(&self) -> Result<(), StoreError>;
}
