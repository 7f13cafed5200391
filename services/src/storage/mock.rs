//! In-memory object storage for tests and local runs.

use super::traits::ObjectStorage;
use super::types::{ObjectEntry, PresignedUrl, PutObjectRequest, StorageError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default number of entries returned by one listing, matching S3.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-memory implementation of `ObjectStorage`.
///
/// Keys are kept in lexicographic order so listings behave like S3. Every call
/// is counted, and puts/deletes can be made to fail to exercise partial
/// failure paths.
#[derive(Clone)]
pub struct MockObjectStorage {
    objects: Arc<RwLock<BTreeMap<String, MockObject>>>,
    calls: Arc<CallCounters>,
    faults: Arc<RwLock<Faults>>,
    page_size: usize,
}

#[derive(Clone)]
struct MockObject {
    content: Vec<u8>,
    content_type: String,
    storage_class: String,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct CallCounters {
    puts: AtomicUsize,
    gets: AtomicUsize,
    lists: AtomicUsize,
    deletes: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    put_key_fragment: Option<String>,
    deletes_before_failure: Option<usize>,
    unreachable: bool,
}

impl Default for MockObjectStorage {
    fn default() -> Self {
        Self {
            objects: Arc::default(),
            calls: Arc::default(),
            faults: Arc::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Makes every put whose key contains `fragment` fail.
    pub fn fail_puts_containing(&self, fragment: impl Into<String>) {
        self.faults.write().expect("lock poisoned").put_key_fragment = Some(fragment.into());
    }

    /// Lets `count` deletes succeed, then fails every later delete.
    pub fn fail_deletes_after(&self, count: usize) {
        self.faults.write().expect("lock poisoned").deletes_before_failure = Some(count);
    }

    /// Makes the connectivity check fail, as a bucket with bad credentials would.
    pub fn set_unreachable(&self) {
        self.faults.write().expect("lock poisoned").unreachable = true;
    }

    /// Inserts an object directly, bypassing counters and faults.
    pub fn insert(&self, key: impl Into<String>, content: Vec<u8>, content_type: &str) {
        let object = MockObject {
            content,
            content_type: content_type.to_owned(),
            storage_class: "STANDARD".to_owned(),
            last_modified: Utc::now(),
        };
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.into(), object);
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().expect("lock poisoned").contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        let objects = self.objects.read().expect("lock poisoned");
        objects.get(key).map(|o| o.content_type.clone())
    }

    pub fn storage_class_of(&self, key: &str) -> Option<String> {
        let objects = self.objects.read().expect("lock poisoned");
        objects.get(key).map(|o| o.storage_class.clone())
    }

    pub fn put_calls(&self) -> usize {
        self.calls.puts.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.calls.gets.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.calls.lists.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.put_calls() + self.get_calls() + self.list_calls() + self.delete_calls()
    }
}

impl ObjectStorage for MockObjectStorage {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError> {
        self.calls.puts.fetch_add(1, Ordering::SeqCst);

        let faults = self.faults.read().expect("lock poisoned");
        let injected = faults
            .put_key_fragment
            .as_deref()
            .is_some_and(|fragment| request.key.contains(fragment));
        if injected {
            return Err(StorageError::StorageError(format!(
                "injected put failure for {}",
                request.key
            )));
        }
        drop(faults);

        let object = MockObject {
            content: request.content,
            content_type: request.content_type,
            storage_class: request.storage_class,
            last_modified: Utc::now(),
        };
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(request.key, object);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.calls.gets.fetch_add(1, Ordering::SeqCst);

        let objects = self.objects.read().expect("lock poisoned");
        objects
            .get(key)
            .map(|o| o.content.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_owned()))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        self.calls.lists.fetch_add(1, Ordering::SeqCst);

        let objects = self.objects.read().expect("lock poisoned");
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .take(self.page_size)
            .map(|(key, o)| {
                ObjectEntry::new(key.clone(), o.content.len() as u64)
                    .with_last_modified(o.last_modified)
            })
            .collect())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let attempt = self.calls.deletes.fetch_add(1, Ordering::SeqCst);

        let faults = self.faults.read().expect("lock poisoned");
        if faults
            .deletes_before_failure
            .is_some_and(|limit| attempt >= limit)
        {
            return Err(StorageError::StorageError(format!(
                "injected delete failure for {key}"
            )));
        }
        drop(faults);

        // S3 deletes are idempotent: a missing key is not an error.
        self.objects.write().expect("lock poisoned").remove(key);
        Ok(())
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        let expires_in = chrono::Duration::from_std(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;
        Ok(PresignedUrl {
            url: format!("https://mock.storage.invalid/{key}?mock=true&content-type={content_type}"),
            method: "PUT".to_owned(),
            expires_at: Utc::now() + expires_in,
        })
    }

    async fn could_connected(&self) -> bool {
        !self.faults.read().expect("lock poisoned").unreachable
    }
}
