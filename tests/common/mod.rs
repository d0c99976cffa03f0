// tests/common/mod.rs
//
// In-memory ObjectStore used by the handler tests. Keys are kept sorted and
// served in pages of `page_size`, like ListObjectsV2, and every call is counted.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use r2files::config::Config;
use r2files::constants::NAME_METADATA_KEY;
use r2files::object_store::{DeleteStatus, ListPage, ObjectHead, ObjectStore, PutRequest};
use r2files::progress::ProgressObserver;

#[derive(Debug, Clone)]
pub struct Entry {
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
    pub content_type: Option<String>,
}

pub struct MemoryStore {
    bucket: String,
    page_size: usize,
    objects: Mutex<BTreeMap<String, Entry>>,
    failing_deletes: Mutex<HashSet<String>>,
    pub list_calls: AtomicUsize,
    pub head_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            bucket: "bucket".to_string(),
            page_size: page_size.max(1),
            objects: Mutex::new(BTreeMap::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            list_calls: AtomicUsize::new(0),
            head_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Seed an object whose `name` metadata is `display_name`.
    pub fn insert(&self, key: &str, display_name: &str) {
        let mut metadata = HashMap::new();
        metadata.insert(NAME_METADATA_KEY.to_string(), display_name.to_string());
        self.objects.lock().unwrap().insert(
            key.to_string(),
            Entry { data: Vec::new(), metadata, content_type: None },
        );
    }

    /// Seed an object with no user metadata at all.
    pub fn insert_without_metadata(&self, key: &str) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            Entry { data: Vec::new(), metadata: HashMap::new(), content_type: None },
        );
    }

    /// Make every delete of `key` fail with a transport-style error.
    pub fn fail_deletes_of(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    pub fn get(&self, key: &str) -> Option<Entry> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_file(
        &self,
        req: PutRequest<'_>,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let data = tokio::fs::read(req.path).await?;
        let total = data.len() as u64;
        if let Some(obs) = observer {
            obs.on_progress(0, Some(total));
            obs.on_progress(total, Some(total));
        }

        let mut metadata = HashMap::new();
        metadata.insert(NAME_METADATA_KEY.to_string(), req.display_name.to_string());
        self.objects.lock().unwrap().insert(
            req.key.to_string(),
            Entry { data, metadata, content_type: Some(req.content_type.to_string()) },
        );
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectHead>> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.objects.lock().unwrap().get(key).map(|e| ObjectHead {
            metadata: e.metadata.clone(),
            content_length: Some(e.data.len() as u64),
            content_type: e.content_type.clone(),
        }))
    }

    async fn list_page(&self, continuation_token: Option<&str>) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap();
        let start = match continuation_token {
            Some(t) => Bound::Excluded(t.to_string()),
            None => Bound::Unbounded,
        };
        let mut remaining = objects.range((start, Bound::Unbounded)).map(|(k, _)| k.clone());
        let keys: Vec<String> = remaining.by_ref().take(self.page_size).collect();
        let is_truncated = remaining.next().is_some();
        Ok(ListPage {
            next_continuation_token: if is_truncated { keys.last().cloned() } else { None },
            keys,
            is_truncated,
        })
    }

    async fn delete(&self, key: &str) -> Result<DeleteStatus> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.lock().unwrap().contains(key) {
            return Err(anyhow!("connection reset while deleting {}", key));
        }
        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted),
            None => Ok(DeleteStatus::NotFound),
        }
    }
}

/// Store that fails every call, for error-path tests.
pub struct BrokenStore;

#[async_trait]
impl ObjectStore for BrokenStore {
    fn bucket(&self) -> &str {
        "broken"
    }

    async fn put_file(&self, _req: PutRequest<'_>, _o: Option<&dyn ProgressObserver>) -> Result<()> {
        Err(anyhow!("Upload failed"))
    }

    async fn head(&self, _key: &str) -> Result<Option<ObjectHead>> {
        Err(anyhow!("Some error"))
    }

    async fn list_page(&self, _token: Option<&str>) -> Result<ListPage> {
        Err(anyhow!("ListObjectsV2 failed"))
    }

    async fn delete(&self, _key: &str) -> Result<DeleteStatus> {
        Err(anyhow!("DeleteObject failed"))
    }
}

/// Config pointing at a fake endpoint with `download_url` as the public base.
pub fn test_config(download_url: Option<&str>) -> Config {
    Config {
        access_key_id: "id".to_string(),
        secret_access_key: "secret".to_string(),
        endpoint: "http://127.0.0.1:9".to_string(),
        bucket: "bucket".to_string(),
        download_url: download_url.map(str::to_string),
        region: "auto".to_string(),
    }
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}
