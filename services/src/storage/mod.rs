//! Object storage gateway.
//!
//! [`ObjectStorage`] is the only way the registry reaches the remote store:
//! put, get, list-by-prefix and delete, plus presigning for direct uploads.
//! [`S3ObjectStorage`] talks to S3 through OpenDAL; [`MockObjectStorage`]
//! keeps everything in memory.

mod mock;
mod s3;
mod traits;
mod types;

pub use mock::{DEFAULT_PAGE_SIZE, MockObjectStorage};
pub use s3::{S3ObjectStorage, S3StorageConfig};
pub use traits::ObjectStorage;
pub use types::{ObjectEntry, PresignedUrl, PutObjectRequest, StorageError};

use std::time::Duration;

/// Storage backend selected at startup.
#[derive(Clone)]
pub enum Storage {
    S3(S3ObjectStorage),
    Memory(MockObjectStorage),
}

impl ObjectStorage for Storage {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError> {
        match self {
            Self::S3(s3) => s3.put_object(request).await,
            Self::Memory(mock) => mock.put_object(request).await,
        }
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::S3(s3) => s3.get_object(key).await,
            Self::Memory(mock) => mock.get_object(key).await,
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        match self {
            Self::S3(s3) => s3.list_objects(prefix).await,
            Self::Memory(mock) => mock.list_objects(prefix).await,
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::S3(s3) => s3.delete_object(key).await,
            Self::Memory(mock) => mock.delete_object(key).await,
        }
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        match self {
            Self::S3(s3) => s3.presign_put(key, content_type, expires_in).await,
            Self::Memory(mock) => mock.presign_put(key, content_type, expires_in).await,
        }
    }

    async fn could_connected(&self) -> bool {
        match self {
            Self::S3(s3) => s3.could_connected().await,
            Self::Memory(mock) => mock.could_connected().await,
        }
    }
}
