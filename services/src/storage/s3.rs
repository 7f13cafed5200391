//! S3 object storage over OpenDAL.

use super::traits::ObjectStorage;
use super::types::{ObjectEntry, PresignedUrl, PutObjectRequest, StorageError};
use chrono::Utc;
use futures::TryStreamExt;
use opendal::Operator;
use std::time::Duration;
use tracing::debug;

/// Configuration for an S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub storage_class: String,
    pub page_size: usize,
}

impl std::fmt::Debug for S3StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("storage_class", &self.storage_class)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

/// S3 file storage. The operator is built once and shared by every clone.
#[derive(Clone)]
pub struct S3ObjectStorage {
    operator: Operator,
    storage_class: String,
    page_size: usize,
}

impl S3ObjectStorage {
    /// Builds the operator. Without explicit keys OpenDAL falls back to the
    /// ambient AWS credential chain.
    pub fn new(config: &S3StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::ConnectionError(
                "No bucket configured".to_owned(),
            ));
        }

        let mut builder = opendal::services::S3::default()
            .bucket(&config.bucket)
            .region(&config.region)
            .default_storage_class(&config.storage_class);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key);
        }

        let operator = Operator::new(builder)
            .map(|op| op.finish())
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        Ok(Self::from_operator(
            operator,
            config.storage_class.clone(),
            config.page_size,
        ))
    }

    /// Wraps an operator that is already built.
    pub fn from_operator(
        operator: Operator,
        storage_class: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            operator,
            storage_class: storage_class.into(),
            page_size,
        }
    }
}

impl ObjectStorage for S3ObjectStorage {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError> {
        // OpenDAL applies the storage class per operator, not per write.
        if request.storage_class != self.storage_class {
            return Err(StorageError::StorageError(format!(
                "storage class {} is not configured on this bucket (expected {})",
                request.storage_class, self.storage_class
            )));
        }

        self.operator
            .write_with(&request.key, request.content)
            .content_type(&request.content_type)
            .await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self.operator.read(key).await?;
        Ok(buffer.to_vec())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        let mut lister = self
            .operator
            .lister_with(prefix)
            .recursive(true)
            .limit(self.page_size)
            .await?;

        let mut entries = Vec::new();
        while entries.len() < self.page_size {
            let Some(entry) = lister.try_next().await? else {
                break;
            };
            let metadata = entry.metadata();
            if !metadata.is_file() {
                continue;
            }
            let mut object = ObjectEntry::new(entry.path(), metadata.content_length());
            if let Some(last_modified) = metadata.last_modified() {
                object = object.with_last_modified(last_modified);
            }
            entries.push(object);
        }

        debug!(prefix, count = entries.len(), "Listed objects");
        Ok(entries)
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await?;
        Ok(())
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(expires_in)
                .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .operator
            .presign_write_with(key, expires_in)
            .content_type(content_type)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at,
        })
    }

    async fn could_connected(&self) -> bool {
        self.operator.check().await.is_ok()
    }
}
