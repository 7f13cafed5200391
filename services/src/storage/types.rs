//! Storage gateway types.

use chrono::{DateTime, Utc};

/// One object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// Request to write one object.
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub storage_class: String,
}

impl PutObjectRequest {
    pub fn new(
        key: impl Into<String>,
        content: Vec<u8>,
        content_type: impl Into<String>,
        storage_class: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            content,
            content_type: content_type.into(),
            storage_class: storage_class.into(),
        }
    }
}

/// Result of a presign operation.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    pub url: String,
    pub method: String,
    pub expires_at: DateTime<Utc>,
}

/// Error type for storage gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Presigning failed: {0}")]
    PresignFailed(String),
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::StorageError(err.to_string())
        }
    }
}
