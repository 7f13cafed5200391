//! Resolving a file id to its storage key.
//!
//! There is no index: [`LinearScan`] lists keys and decodes each one until the
//! id matches. The trait exists so an indexed lookup can replace it without
//! touching the registry.

use super::codec::{decode_key, owner_prefix};
use crate::storage::{ObjectEntry, ObjectStorage, StorageError};
use std::future::Future;
use tracing::debug;

pub trait FileLookup: Clone + Send + Sync + 'static {
    /// Finds the key of `file_id` anywhere in the bucket.
    fn find_key<S: ObjectStorage>(
        &self,
        storage: &S,
        file_id: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Finds the key of `file_id` among the keys of one owner.
    fn find_key_for_owner<S: ObjectStorage>(
        &self,
        storage: &S,
        owner_id: &str,
        file_id: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;
}

/// Full listing plus client-side filtering.
///
/// Costs one list call over every object in scope per lookup, O(n) in the
/// bucket size for [`FileLookup::find_key`]. When several keys decode to the
/// same id, the first one in listing order wins. Only the first listing page
/// is searched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl FileLookup for LinearScan {
    async fn find_key<S: ObjectStorage>(
        &self,
        storage: &S,
        file_id: &str,
    ) -> Result<Option<String>, StorageError> {
        let entries = storage.list_objects("").await?;
        debug!(file_id, scanned = entries.len(), "Scanning bucket for file id");
        Ok(first_match(entries, file_id))
    }

    async fn find_key_for_owner<S: ObjectStorage>(
        &self,
        storage: &S,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<String>, StorageError> {
        let entries = storage.list_objects(&owner_prefix(owner_id)).await?;
        debug!(owner_id, file_id, scanned = entries.len(), "Scanning owner for file id");
        Ok(first_match(entries, file_id))
    }
}

fn first_match(entries: Vec<ObjectEntry>, file_id: &str) -> Option<String> {
    entries
        .into_iter()
        .find(|entry| decode_key(&entry.key).file_id == file_id)
        .map(|entry| entry.key)
}
