//! Gateway operations over the backing object store

use crate::content_type::resolve_content_type;
use crate::error::StorageError;
use crate::store::{ObjectMetadata, ObjectStat, ObjectStore, StoreError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Lifetime of a signed download URL.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Prefix under which every artifact is stored.
const KEY_PREFIX: &str = "downloads";

// User-metadata names. S3-compatible stores fold these to lowercase on
// the wire, so they are canonically lowercase here.
const META_TASK_ID: &str = "task-id";
const META_UPLOAD_TIME: &str = "upload-time";
const META_ORIGINAL_NAME: &str = "original-name";

/// Record returned by a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub key: String,
    pub file_name: String,
    pub upload_time: DateTime<Utc>,
}

/// Time-limited download capability
///
/// Self-contained: the store validates the signature without any state
/// held by the gateway. Recomputed on every call, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Read view of a stored object, reconstructed from store metadata
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub key: String,
    pub task_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub upload_time: DateTime<Utc>,
}

/// Stateless gateway over a remote object store
///
/// Holds nothing but the injected store handle; every operation is a live
/// round trip, and the store remains the sole source of truth.
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
}

impl StorageGateway {
    /// Create a gateway over the given store
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Reference to the underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Object key of a task artifact: `downloads/{task_id}/{file_name}`
    pub fn object_key(task_id: &str, file_name: &str) -> String {
        format!("{KEY_PREFIX}/{task_id}/{file_name}")
    }

    /// Upload a local file as an artifact of `task_id`
    ///
    /// Reads the whole file into memory, stores it under
    /// `downloads/{task_id}/{base name}` with task metadata attached, and
    /// overwrites any object already at that key. `format` only selects
    /// the content type; unknown formats fall back to a generic binary
    /// type rather than failing. The source file is left untouched.
    pub async fn upload(
        &self,
        file_path: impl AsRef<Path>,
        task_id: &str,
        format: &str,
    ) -> Result<UploadResult, StorageError> {
        let path = file_path.as_ref();
        validate_task_id(task_id)?;

        let data = tokio::fs::read(path).await.map_err(|source| {
            error!(path = %path.display(), error = ?source, "upload failed: cannot read source file");
            StorageError::SourceFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            // Unreachable for a path that was just read as a file, but
            // kept total instead of panicking.
            None => {
                return Err(StorageError::SourceFile {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "path has no file name",
                    ),
                })
            }
        };

        let key = Self::object_key(task_id, &file_name);
        let upload_time = Utc::now();
        let size = data.len();
        let content_type = resolve_content_type(format);

        let mut user_metadata = HashMap::new();
        user_metadata.insert(META_TASK_ID.to_string(), task_id.to_string());
        user_metadata.insert(META_UPLOAD_TIME.to_string(), upload_time.to_rfc3339());
        user_metadata.insert(
            META_ORIGINAL_NAME.to_string(),
            utf8_percent_encode(&file_name, NON_ALPHANUMERIC).to_string(),
        );
        let metadata = ObjectMetadata {
            content_type: Some(content_type.to_string()),
            user_metadata,
        };

        self.store
            .put_object(&key, Bytes::from(data), metadata)
            .await
            .map_err(|source| {
                error!(key = %key, error = ?source, "upload failed");
                StorageError::Upload {
                    key: key.clone(),
                    source,
                }
            })?;

        info!(
            task_id = %task_id,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            "uploaded artifact"
        );
        Ok(UploadResult {
            key,
            file_name,
            upload_time,
        })
    }

    /// Pre-signed GET URL for `key`, valid for one hour from now
    ///
    /// Key existence is not checked: signing is pure URL computation, and
    /// a URL for an absent key simply yields not-found when fetched.
    pub async fn download_url(&self, key: &str) -> Result<SignedUrl, StorageError> {
        let url = self
            .store
            .presign_get(key, SIGNED_URL_TTL)
            .await
            .map_err(|source| {
                error!(key = %key, error = ?source, "signed URL generation failed");
                StorageError::DownloadUrl {
                    key: key.to_string(),
                    source,
                }
            })?;
        let expires_at = Utc::now() + chrono::Duration::seconds(SIGNED_URL_TTL.as_secs() as i64);
        debug!(key = %key, expires_at = %expires_at, "issued signed download URL");
        Ok(SignedUrl { url, expires_at })
    }

    /// Delete the object at `key`
    ///
    /// Deleting an absent key succeeds; the store treats delete as
    /// idempotent. No retry is attempted on failure.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete_object(key).await.map_err(|source| {
            error!(key = %key, error = ?source, "delete failed");
            StorageError::Delete {
                key: key.to_string(),
                source,
            }
        })?;
        debug!(key = %key, "deleted artifact");
        Ok(())
    }

    /// Best-effort read view of the object at `key`
    ///
    /// Returns `None` when the object carries no retrievable metadata and
    /// on every failure; failures are logged, never raised. `None` means
    /// "no info available", not proof of absence.
    pub async fn file_info(&self, key: &str) -> Option<FileInfo> {
        let stat = match self.store.stat_object(key).await {
            Ok(stat) => stat,
            Err(StoreError::NoSuchKey(_)) => {
                error!(key = %key, "file info unavailable: no such object");
                return None;
            }
            Err(err) => {
                error!(key = %key, error = ?err, "file info unavailable");
                return None;
            }
        };
        if stat.user_metadata.is_empty() {
            debug!(key = %key, "object carries no metadata");
            return None;
        }
        Some(build_file_info(key, stat))
    }

    /// Delete every artifact stored for `task_id`
    ///
    /// Lists `downloads/{task_id}/` and deletes each key in turn; the
    /// first failure aborts the purge. Returns the number of objects
    /// deleted.
    pub async fn purge_task(&self, task_id: &str) -> Result<usize, StorageError> {
        validate_task_id(task_id)?;
        let prefix = format!("{KEY_PREFIX}/{task_id}/");
        let keys = self.store.list_keys(&prefix).await.map_err(|source| {
            error!(task_id = %task_id, error = ?source, "purge failed: cannot list task artifacts");
            StorageError::Purge {
                task_id: task_id.to_string(),
                source,
            }
        })?;
        for key in &keys {
            self.store.delete_object(key).await.map_err(|source| {
                error!(task_id = %task_id, key = %key, error = ?source, "purge failed");
                StorageError::Purge {
                    task_id: task_id.to_string(),
                    source,
                }
            })?;
        }
        info!(task_id = %task_id, deleted = keys.len(), "purged task artifacts");
        Ok(keys.len())
    }

    /// Probe the backing store and bucket
    pub async fn health_check(&self) -> bool {
        match self.store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = ?err, "store health check failed");
                false
            }
        }
    }
}

/// The task id becomes a key segment; an empty one or one containing `/`
/// would silently re-shape the key schema.
fn validate_task_id(task_id: &str) -> Result<(), StorageError> {
    if task_id.is_empty() || task_id.contains('/') {
        return Err(StorageError::InvalidTaskId {
            task_id: task_id.to_string(),
        });
    }
    Ok(())
}

fn build_file_info(key: &str, stat: ObjectStat) -> FileInfo {
    let meta = &stat.user_metadata;
    let task_id = meta
        .get(META_TASK_ID)
        .cloned()
        .unwrap_or_else(|| task_id_from_key(key).to_string());
    let file_name = meta
        .get(META_ORIGINAL_NAME)
        .and_then(|encoded| decode_file_name(encoded))
        .unwrap_or_else(|| file_name_from_key(key).to_string());
    let upload_time = meta
        .get(META_UPLOAD_TIME)
        .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
        .map(|stamp| stamp.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    FileInfo {
        key: key.to_string(),
        task_id,
        file_name,
        content_type: stat
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        size: stat.size.unwrap_or(0),
        upload_time,
    }
}

/// Middle segment of `downloads/{task_id}/{file_name}`.
fn task_id_from_key(key: &str) -> &str {
    key.split('/').nth(1).unwrap_or_default()
}

/// Everything after the last `/`, or the whole key if it has none.
fn file_name_from_key(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

fn decode_file_name(encoded: &str) -> Option<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}
