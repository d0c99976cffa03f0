// src/multipart.rs
//
// Multipart Upload (MPU) of a local file, for files too large for one PutObject.
//
// Design:
// - plan_parts() cuts the file into numbered (offset, len) ranges.
// - Each part body streams straight from disk (ByteStream::read_from), so the
//   file is never held in memory.
// - At most `max_in_flight` UploadPart calls run at once; progress is reported
//   as each part completes.
// - Any failure aborts the MPU so the store discards the uploaded parts.

use std::path::Path;

use anyhow::{bail, Context, Result};
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_CONCURRENT_UPLOADS, DEFAULT_S3_MULTIPART_PART_SIZE, DEFAULT_S3_MULTIPART_THRESHOLD,
    MAX_MULTIPART_PARTS, MIN_S3_MULTIPART_PART_SIZE, NAME_METADATA_KEY,
};
use crate::object_store::PutRequest;
use crate::progress::ProgressObserver;

#[derive(Clone, Debug)]
pub struct MultipartUploadConfig {
    /// Files of at least this many bytes use MPU.
    pub threshold: u64,
    /// Target size of each part in bytes (AWS minimum is 5 MiB).
    pub part_size: u64,
    /// Maximum number of concurrent in-flight part uploads.
    pub max_in_flight: usize,
}

impl Default for MultipartUploadConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_S3_MULTIPART_THRESHOLD,
            part_size: DEFAULT_S3_MULTIPART_PART_SIZE,
            max_in_flight: DEFAULT_CONCURRENT_UPLOADS,
        }
    }
}

impl MultipartUploadConfig {
    pub fn use_multipart(&self, file_len: u64) -> bool {
        file_len >= self.threshold
    }

    /// Part size actually used for `file_len`: never below the S3 minimum and
    /// large enough to stay within the part-count limit.
    pub fn effective_part_size(&self, file_len: u64) -> u64 {
        let floor = file_len.div_ceil(MAX_MULTIPART_PARTS);
        self.part_size.max(MIN_S3_MULTIPART_PART_SIZE).max(floor)
    }
}

/// One byte range of the source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartSpec {
    /// 1-based, as S3 expects.
    pub number: i32,
    pub offset: u64,
    pub len: u64,
}

/// Split `file_len` bytes into consecutive parts of `part_size` (last one shorter).
pub fn plan_parts(file_len: u64, part_size: u64) -> Vec<PartSpec> {
    let mut parts = Vec::new();
    if part_size == 0 {
        return parts;
    }
    let mut offset = 0u64;
    let mut number = 1i32;
    while offset < file_len {
        let len = part_size.min(file_len - offset);
        parts.push(PartSpec { number, offset, len });
        offset += len;
        number += 1;
    }
    parts
}

/// Result info returned once the upload completes
#[derive(Clone, Debug)]
pub struct MultipartCompleteInfo {
    pub e_tag: Option<String>,
    pub total_bytes: u64,
    pub parts: usize,
}

/// An open multipart upload for one key.
struct MultipartUpload<'a> {
    client: &'a Client,
    bucket: &'a str,
    key: &'a str,
    upload_id: String,
}

impl<'a> MultipartUpload<'a> {
    /// Issues CreateMultipartUpload with the object's metadata and content type.
    async fn create(client: &'a Client, bucket: &'a str, req: &PutRequest<'a>) -> Result<Self> {
        let resp = client
            .create_multipart_upload()
            .bucket(bucket)
            .key(req.key)
            .metadata(NAME_METADATA_KEY, req.display_name)
            .content_type(req.content_type)
            .send()
            .await
            .context("CreateMultipartUpload failed")?;
        let upload_id = resp.upload_id().unwrap_or_default().to_string();
        if upload_id.is_empty() {
            bail!("CreateMultipartUpload returned empty upload_id");
        }
        debug!("Started multipart upload {} for {}", upload_id, req.key);
        Ok(Self { client, bucket, key: req.key, upload_id })
    }

    async fn upload_part(&self, path: &Path, part: PartSpec) -> Result<CompletedPart> {
        let body = ByteStream::read_from()
            .path(path)
            .offset(part.offset)
            .length(Length::Exact(part.len))
            .build()
            .await
            .with_context(|| format!("Failed to read part {} of {}", part.number, path.display()))?;

        let resp = self
            .client
            .upload_part()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(&self.upload_id)
            .part_number(part.number)
            .body(body)
            .send()
            .await
            .with_context(|| format!("UploadPart {} failed", part.number))?;

        let etag = resp.e_tag().unwrap_or_default().to_string();
        if etag.is_empty() {
            bail!("UploadPart {} returned empty ETag", part.number);
        }
        Ok(CompletedPart::builder()
            .e_tag(etag)
            .part_number(part.number)
            .build())
    }

    async fn complete(&self, mut parts: Vec<CompletedPart>) -> Result<Option<String>> {
        parts.sort_by_key(|p| p.part_number());
        let cmu = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();
        let resp = self
            .client
            .complete_multipart_upload()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(&self.upload_id)
            .multipart_upload(cmu)
            .send()
            .await
            .context("CompleteMultipartUpload failed")?;
        Ok(resp.e_tag().map(str::to_string))
    }

    /// Best effort; the original error is what the caller reports.
    async fn abort(&self) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(&self.upload_id)
            .send()
            .await
        {
            warn!("AbortMultipartUpload for {} failed: {}", self.key, e);
        }
    }
}

/// Upload `req.path` (of `file_len` bytes) to `bucket` as a multipart upload.
pub async fn upload_file_multipart(
    client: &Client,
    bucket: &str,
    req: &PutRequest<'_>,
    file_len: u64,
    cfg: &MultipartUploadConfig,
    observer: Option<&dyn ProgressObserver>,
) -> Result<MultipartCompleteInfo> {
    if cfg.max_in_flight == 0 {
        bail!("max_in_flight must be >= 1");
    }
    let plan = plan_parts(file_len, cfg.effective_part_size(file_len));
    let mpu = MultipartUpload::create(client, bucket, req).await?;

    let mpu_ref = &mpu;
    let mut in_flight = stream::iter(plan.iter().copied())
        .map(|part| async move {
            mpu_ref.upload_part(req.path, part).await.map(|done| (part.len, done))
        })
        .buffer_unordered(cfg.max_in_flight);

    let mut completed = Vec::with_capacity(plan.len());
    let mut transferred = 0u64;
    while let Some(result) = in_flight.next().await {
        match result {
            Ok((len, part)) => {
                transferred += len;
                completed.push(part);
                if let Some(obs) = observer {
                    obs.on_progress(transferred, Some(file_len));
                }
            }
            Err(e) => {
                drop(in_flight);
                mpu.abort().await;
                return Err(e);
            }
        }
    }
    drop(in_flight);

    let e_tag = match mpu.complete(completed).await {
        Ok(tag) => tag,
        Err(e) => {
            mpu.abort().await;
            return Err(e);
        }
    };

    Ok(MultipartCompleteInfo {
        e_tag,
        total_bytes: transferred,
        parts: plan.len(),
    })
}
