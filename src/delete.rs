// src/delete.rs
//
// Single-key delete and whole-bucket delete.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::listing::{list_all_objects, EMPTY_BUCKET_MESSAGE};
use crate::object_store::{DeleteStatus, ObjectStore};

pub const DELETED_MESSAGE: &str = "File deleted successfully";
pub const NOT_FOUND_MESSAGE: &str = "File not found.";

impl DeleteStatus {
    /// User-facing result line.
    pub fn message(&self) -> &'static str {
        match self {
            DeleteStatus::Deleted => DELETED_MESSAGE,
            DeleteStatus::NotFound => NOT_FOUND_MESSAGE,
        }
    }
}

/// Delete one object. A missing key is a normal outcome, not an error.
pub async fn delete_object(store: &dyn ObjectStore, key: &str) -> Result<DeleteStatus> {
    let status = store.delete(key).await?;
    info!("DELETE {} -> {:?}", key, status);
    Ok(status)
}

/// One key `delete_all` could not remove.
#[derive(Debug)]
pub struct DeleteFailure {
    pub key: String,
    pub error: anyhow::Error,
}

/// Outcome counts for `delete_all`.
#[derive(Debug, Default)]
pub struct DeleteSummary {
    pub deleted: usize,
    pub not_found: usize,
    pub failures: Vec<DeleteFailure>,
}

impl DeleteSummary {
    pub fn attempted(&self) -> usize {
        self.deleted + self.not_found + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything `delete-all` prints: counts then one line per failure, or the
/// empty-bucket line when there was nothing to delete.
pub fn summary_lines(summary: Option<&DeleteSummary>) -> Vec<String> {
    let Some(summary) = summary else {
        return vec![format!("{} Nothing was deleted.", EMPTY_BUCKET_MESSAGE)];
    };

    let mut lines = vec![format!(
        "Deleted {} of {} objects ({} already gone, {} failed)",
        summary.deleted,
        summary.attempted(),
        summary.not_found,
        summary.failures.len()
    )];
    lines.extend(
        summary
            .failures
            .iter()
            .map(|f| format!("  {}: {:#}", f.key, f.error)),
    );
    lines
}

/// Delete every object in the bucket with at most `jobs` requests in flight.
///
/// Returns `Ok(None)` for an empty bucket. Listing errors abort; per-object
/// errors are collected into the summary and do not stop the batch.
pub async fn delete_all(store: &dyn ObjectStore, jobs: usize) -> Result<Option<DeleteSummary>> {
    let Some(objects) = list_all_objects(store).await? else {
        return Ok(None);
    };
    if objects.is_empty() {
        return Ok(None);
    }

    let jobs = jobs.max(1);
    debug!("Deleting {} objects, {} at a time", objects.len(), jobs);

    let mut results = stream::iter(objects)
        .map(|obj| async move {
            let outcome = store.delete(&obj.key).await;
            (obj.key, outcome)
        })
        .buffer_unordered(jobs);

    let mut summary = DeleteSummary::default();
    while let Some((key, outcome)) = results.next().await {
        match outcome {
            Ok(DeleteStatus::Deleted) => summary.deleted += 1,
            Ok(DeleteStatus::NotFound) => summary.not_found += 1,
            Err(error) => {
                warn!("Failed to delete {}: {:#}", key, error);
                summary.failures.push(DeleteFailure { key, error });
            }
        }
    }

    info!(
        "delete-all: {} deleted, {} not found, {} failed",
        summary.deleted,
        summary.not_found,
        summary.failures.len()
    );
    Ok(Some(summary))
}
