// src/object_store.rs
//
// Object-store abstraction for the single configured bucket.
// The trait exposes exactly the calls the command handlers make
// (put, head, list-page, delete) so handlers can run against any backend.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::constants::NAME_METADATA_KEY;
use crate::progress::ProgressObserver;

/// An object as presented to the user: storage key plus original file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub display_name: String,
}

/// What a HEAD-style probe returns for an existing object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    /// User metadata (`x-amz-meta-*`), keys lower-cased by the store.
    pub metadata: HashMap<String, String>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

impl ObjectHead {
    /// The original file name recorded at upload time, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.metadata.get(NAME_METADATA_KEY).map(String::as_str)
    }
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

impl ListPage {
    /// Token for the next request, or `None` when the listing is complete.
    pub fn next_token(&self) -> Option<&str> {
        if self.is_truncated {
            self.next_continuation_token.as_deref()
        } else {
            None
        }
    }
}

/// Result of deleting one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    NotFound,
}

/// Everything needed to store one local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest<'a> {
    pub key: &'a str,
    pub path: &'a Path,
    /// Stored as the `name` metadata entry.
    pub display_name: &'a str,
    pub content_type: &'a str,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store operates on.
    fn bucket(&self) -> &str;

    /// Upload a local file, reporting progress to `observer` if given.
    async fn put_file(
        &self,
        req: PutRequest<'_>,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<()>;

    /// Metadata for `key`, or `None` when the object does not exist.
    async fn head(&self, key: &str) -> Result<Option<ObjectHead>>;

    /// One page of keys, starting after `continuation_token`.
    async fn list_page(&self, continuation_token: Option<&str>) -> Result<ListPage>;

    /// Delete a single object.
    async fn delete(&self, key: &str) -> Result<DeleteStatus>;

    /// Check if an object exists. Errors other than not-found propagate.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.head(key).await?.is_some())
    }
}
