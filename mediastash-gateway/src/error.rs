//! Gateway error taxonomy

use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by gateway operations
///
/// Remote failures keep the transport error as their source. The gateway
/// never retries; callers own any retry or cleanup policy.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot read source file {}", .path.display())]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid task id: {task_id:?}")]
    InvalidTaskId { task_id: String },

    #[error("Upload failed for {key}")]
    Upload {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Signed download URL could not be generated for {key}")]
    DownloadUrl {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Delete failed for {key}")]
    Delete {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Purge failed for task {task_id}")]
    Purge {
        task_id: String,
        #[source]
        source: StoreError,
    },
}
