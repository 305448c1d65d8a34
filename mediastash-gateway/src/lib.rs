//! S3-compatible object-storage gateway for task artifacts
//!
//! Uploads task-produced media files under `downloads/{task_id}/{file_name}`,
//! issues time-limited download URLs, deletes objects, and reconstructs a
//! best-effort metadata view. The remote store is the sole source of
//! truth: the gateway holds no state beyond an injected store handle.

pub mod config;
pub mod content_type;
pub mod error;
pub mod gateway;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use content_type::resolve_content_type;
pub use error::StorageError;
pub use gateway::{FileInfo, SignedUrl, StorageGateway, UploadResult, SIGNED_URL_TTL};
pub use store::{MemoryStore, ObjectStore, S3Store};
