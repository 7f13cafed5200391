//! File registry types.

use super::codec::{decode_key, infer_content_type};
use super::policy::ContentTypePolicy;
use crate::storage::{ObjectEntry, StorageError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// A stored file as seen through its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: String,
    pub owner_id: String,
    pub file_name: String,
    pub content_type: String,
    pub storage_key: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Rebuilds a record from a listing entry. The content type comes from the
    /// key suffix, never from upload metadata.
    pub fn from_entry(entry: &ObjectEntry) -> Self {
        let decoded = decode_key(&entry.key);
        Self {
            file_id: decoded.file_id,
            owner_id: decoded.owner_id,
            file_name: decoded.file_name,
            content_type: infer_content_type(&entry.key).to_owned(),
            storage_key: entry.key.clone(),
            size: entry.size,
            upload_date: entry.last_modified,
        }
    }
}

/// A record with its payload inlined as standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecordWithContent {
    #[serde(flatten)]
    pub record: FileRecord,
    pub encoded_content: String,
}

/// One file to upload.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl UploadItem {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content,
        }
    }
}

/// A presigned direct upload to a registry key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub file_id: String,
    pub storage_key: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub expires_at: DateTime<Utc>,
}

/// Values that parameterize the registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub bucket: String,
    pub storage_class: String,
    pub policy: ContentTypePolicy,
    pub presign_expiry: Duration,
}

/// Default lifetime of a presigned upload URL.
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(60);

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            bucket: "test-bucket".to_owned(),
            storage_class: "STANDARD".to_owned(),
            policy: ContentTypePolicy::default(),
            presign_expiry: DEFAULT_PRESIGN_EXPIRY,
        }
    }
}

/// Error type for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Content type not allowed: {content_type}")]
    Validation { content_type: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(#[source] StorageError),

    /// Items before `index` were written and stay written.
    #[error(
        "Batch upload aborted at item {index} ({file_name}) after {committed} uploads: {source}"
    )]
    BatchAborted {
        index: usize,
        file_name: String,
        committed: usize,
        #[source]
        source: Box<RegistryError>,
    },
}

impl RegistryError {
    /// The error that decided the outcome, unwrapping batch aborts.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::BatchAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<StorageError> for RegistryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Self::NotFound(key),
            other => Self::Backend(other),
        }
    }
}
