//! Storage gateway trait.

use super::types::{ObjectEntry, PresignedUrl, PutObjectRequest, StorageError};
use std::future::Future;
use std::time::Duration;

/// Narrow interface over an object store bound to a single bucket.
///
/// Implementations carry no business logic. Every call is a single round trip
/// to the backend and is never retried here.
pub trait ObjectStorage: Clone + Send + Sync + 'static {
    fn put_object(
        &self,
        request: PutObjectRequest,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn get_object(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Lists one page of objects whose key starts with `prefix`, in key order.
    ///
    /// Objects past the page size are not returned.
    fn list_objects(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<ObjectEntry>, StorageError>> + Send;

    fn delete_object(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> impl Future<Output = Result<PresignedUrl, StorageError>> + Send;

    fn could_connected(&self) -> impl Future<Output = bool> + Send;
}
