//! Object store backends

mod memory;
mod s3;
mod traits;

#[cfg(test)]
mod tests;

pub use memory::MemoryStore;
pub use s3::S3Store;
pub use traits::{BoxError, ObjectMetadata, ObjectStat, ObjectStore, StoreError};
