//! The file registry: every operation exposed to the HTTP layer.

use super::codec::{encode_key, infer_content_type, owner_prefix};
use super::lookup::{FileLookup, LinearScan};
use super::types::{
    FileRecord, FileRecordWithContent, PresignedUpload, RegistryError, RegistrySettings,
    UploadItem,
};
use crate::storage::{ObjectStorage, PutObjectRequest};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use tracing::{debug, info, warn};

#[derive(Clone)]
enum Backend<S> {
    Ready(S),
    Unavailable(String),
}

/// Stateless orchestrator over a storage gateway.
///
/// Holds no cache and no locks; every call goes to storage. Calls are issued
/// one after another and never retried.
#[derive(Clone)]
pub struct FileRegistry<S, L = LinearScan> {
    backend: Backend<S>,
    lookup: L,
    settings: RegistrySettings,
}

impl<S: ObjectStorage> FileRegistry<S, LinearScan> {
    pub fn new(storage: S, settings: RegistrySettings) -> Self {
        Self::with_lookup(storage, LinearScan, settings)
    }

    /// A registry whose gateway could not be built. Every operation fails with
    /// [`RegistryError::BackendUnavailable`] without touching storage.
    pub fn unavailable(reason: impl Into<String>, settings: RegistrySettings) -> Self {
        Self {
            backend: Backend::Unavailable(reason.into()),
            lookup: LinearScan,
            settings,
        }
    }
}

impl<S: ObjectStorage, L: FileLookup> FileRegistry<S, L> {
    pub fn with_lookup(storage: S, lookup: L, settings: RegistrySettings) -> Self {
        Self {
            backend: Backend::Ready(storage),
            lookup,
            settings,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Ready(_))
    }

    fn storage(&self) -> Result<&S, RegistryError> {
        match &self.backend {
            Backend::Ready(storage) => Ok(storage),
            Backend::Unavailable(reason) => Err(RegistryError::BackendUnavailable(reason.clone())),
        }
    }

    pub async fn could_connected(&self) -> bool {
        match &self.backend {
            Backend::Ready(storage) => storage.could_connected().await,
            Backend::Unavailable(_) => false,
        }
    }

    /// Stores one file under a freshly generated id.
    ///
    /// The content type is checked before anything else, so a rejected upload
    /// never reaches storage. Exactly one object is written on success.
    pub async fn upload(
        &self,
        owner_id: &str,
        item: UploadItem,
    ) -> Result<FileRecord, RegistryError> {
        if !self.settings.policy.is_acceptable(&item.content_type) {
            return Err(RegistryError::Validation {
                content_type: item.content_type,
            });
        }
        let storage = self.storage()?;

        let file_id = uuid::Uuid::new_v4().to_string();
        let storage_key = encode_key(owner_id, &file_id, &item.file_name);
        let size = item.content.len() as u64;

        storage
            .put_object(PutObjectRequest::new(
                storage_key.clone(),
                item.content,
                item.content_type.clone(),
                self.settings.storage_class.clone(),
            ))
            .await?;

        info!(
            bucket = %self.settings.bucket,
            storage_key = %storage_key,
            size,
            "File uploaded"
        );

        Ok(FileRecord {
            file_id,
            owner_id: owner_id.to_owned(),
            file_name: item.file_name,
            content_type: item.content_type,
            storage_key,
            size,
            upload_date: Some(chrono::Utc::now()),
        })
    }

    /// Uploads items one at a time, in order, stopping at the first failure.
    ///
    /// Items written before the failure are not rolled back; the returned
    /// [`RegistryError::BatchAborted`] says how many there were.
    pub async fn upload_many(
        &self,
        owner_id: &str,
        items: Vec<UploadItem>,
    ) -> Result<Vec<FileRecord>, RegistryError> {
        let mut records = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let file_name = item.file_name.clone();
            match self.upload(owner_id, item).await {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(
                        owner_id,
                        index,
                        file_name = %file_name,
                        committed = records.len(),
                        error = %err,
                        "Batch upload aborted"
                    );
                    return Err(RegistryError::BatchAborted {
                        index,
                        file_name,
                        committed: records.len(),
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(records)
    }

    /// One record per object on the first listing page, in storage order.
    pub async fn list_all(&self) -> Result<Vec<FileRecord>, RegistryError> {
        let storage = self.storage()?;
        let entries = storage.list_objects("").await?;
        Ok(entries.iter().map(FileRecord::from_entry).collect())
    }

    /// Every file of `owner_id` with its content inlined.
    ///
    /// Downloads each object in turn. An owner without keys is indistinguishable
    /// from an unknown owner and yields [`RegistryError::NotFound`].
    pub async fn list_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<FileRecordWithContent>, RegistryError> {
        let storage = self.storage()?;
        let entries = storage.list_objects(&owner_prefix(owner_id)).await?;

        let mut files = Vec::with_capacity(entries.len());
        for entry in &entries {
            let content = storage.get_object(&entry.key).await?;
            files.push(FileRecordWithContent {
                record: FileRecord::from_entry(entry),
                encoded_content: BASE64_STANDARD.encode(content),
            });
        }

        if files.is_empty() {
            return Err(RegistryError::NotFound(format!(
                "No files found for owner {owner_id}"
            )));
        }
        Ok(files)
    }

    /// Content of `file_id`, located by scanning the whole bucket.
    pub async fn fetch_by_id(&self, file_id: &str) -> Result<Vec<u8>, RegistryError> {
        let storage = self.storage()?;
        let key = self
            .lookup
            .find_key(storage, file_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("File {file_id} not found")))?;

        debug!(file_id, storage_key = %key, "Resolved file id");
        Ok(storage.get_object(&key).await?)
    }

    /// Key of `file_id` among the keys of `owner_id`, or `None`.
    pub async fn find_key_by_file_id(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<String>, RegistryError> {
        let storage = self.storage()?;
        Ok(self
            .lookup
            .find_key_for_owner(storage, owner_id, file_id)
            .await?)
    }

    /// Content of `file_id` only if it belongs to `owner_id`.
    pub async fn download_for_owner(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Vec<u8>, RegistryError> {
        let key = self
            .find_key_by_file_id(owner_id, file_id)
            .await?
            .ok_or_else(|| {
                RegistryError::NotFound(format!("File {file_id} not found for owner {owner_id}"))
            })?;
        Ok(self.storage()?.get_object(&key).await?)
    }

    /// Deletes every object on the first listing page, regardless of owner.
    ///
    /// Deletes run one by one. If one fails, the error is returned and the
    /// objects deleted before it stay deleted. Returns how many were removed.
    pub async fn delete_all(&self) -> Result<usize, RegistryError> {
        let storage = self.storage()?;
        let entries = storage.list_objects("").await?;

        for (deleted, entry) in entries.iter().enumerate() {
            if let Err(err) = storage.delete_object(&entry.key).await {
                warn!(
                    bucket = %self.settings.bucket,
                    storage_key = %entry.key,
                    deleted,
                    remaining = entries.len() - deleted,
                    error = %err,
                    "Bulk delete stopped"
                );
                return Err(err.into());
            }
        }

        info!(bucket = %self.settings.bucket, deleted = entries.len(), "All files deleted");
        Ok(entries.len())
    }

    /// Presigns a direct PUT to a new registry key for `file_name`.
    ///
    /// The content type is inferred from the name and must pass the policy.
    /// Nothing is written until the client uses the URL.
    pub async fn presign_upload(
        &self,
        owner_id: &str,
        file_name: &str,
    ) -> Result<PresignedUpload, RegistryError> {
        let content_type = infer_content_type(file_name);
        if !self.settings.policy.is_acceptable(content_type) {
            return Err(RegistryError::Validation {
                content_type: content_type.to_owned(),
            });
        }
        let storage = self.storage()?;

        let file_id = uuid::Uuid::new_v4().to_string();
        let storage_key = encode_key(owner_id, &file_id, file_name);
        let presigned = storage
            .presign_put(&storage_key, content_type, self.settings.presign_expiry)
            .await?;

        info!(storage_key = %storage_key, expires_at = %presigned.expires_at, "Presigned upload URL");

        Ok(PresignedUpload {
            file_id,
            storage_key,
            content_type: content_type.to_owned(),
            url: presigned.url,
            method: presigned.method,
            expires_at: presigned.expires_at,
        })
    }
}
