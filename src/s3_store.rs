// src/s3_store.rs
//
//! `ObjectStore` backed by the AWS Rust SDK, pointed at an S3-compatible
//! endpoint (Cloudflare R2 by default) with static credentials.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::config::Config;
use crate::constants::NAME_METADATA_KEY;
use crate::multipart::{upload_file_multipart, MultipartUploadConfig};
use crate::object_store::{DeleteStatus, ListPage, ObjectHead, ObjectStore, PutRequest};
use crate::progress::ProgressObserver;

const CREDENTIALS_PROVIDER: &str = "r2-files";

// -----------------------------------------------------------------------------
// Error helpers
// -----------------------------------------------------------------------------

/// HTTP status of the response behind an SDK error, when there was one.
fn http_status<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|resp| resp.status().as_u16())
}

/// Not-found from the status alone, or from the S3 error code when the store sets one.
fn is_not_found<E: ProvideErrorMetadata>(err: &SdkError<E>) -> bool {
    if http_status(err) == Some(404) {
        return true;
    }
    matches!(
        err.as_service_error().and_then(|e| e.code()),
        Some("NoSuchKey") | Some("NotFound")
    )
}

// -----------------------------------------------------------------------------
// Client factory
// -----------------------------------------------------------------------------

/// Build an SDK client for `cfg`: static credentials, custom endpoint,
/// path-style addressing and no SDK-level retries.
pub async fn build_client(cfg: &Config) -> Client {
    let credentials = Credentials::new(
        cfg.access_key_id.clone(),
        cfg.secret_access_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER,
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(cfg.region.clone()))
        .endpoint_url(&cfg.endpoint)
        .credentials_provider(credentials)
        .retry_config(RetryConfig::disabled())
        .load()
        .await;

    // Virtual-hosted style (bucket.endpoint) does not resolve on custom
    // endpoints; path-style (endpoint/bucket) works everywhere.
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();
    debug!("Built S3 client for endpoint {} (region {})", cfg.endpoint, cfg.region);
    Client::from_conf(s3_config)
}

/// The configured bucket, reached through the AWS SDK.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
    bucket: String,
    multipart: MultipartUploadConfig,
}

impl S3Store {
    pub async fn from_config(cfg: &Config) -> Self {
        Self::with_client(build_client(cfg).await, &cfg.bucket)
    }

    pub fn with_client(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            multipart: MultipartUploadConfig::default(),
        }
    }

    pub fn with_multipart_config(mut self, multipart: MultipartUploadConfig) -> Self {
        self.multipart = multipart;
        self
    }

    async fn put_single(
        &self,
        req: &PutRequest<'_>,
        file_len: u64,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<()> {
        let body = ByteStream::from_path(req.path)
            .await
            .with_context(|| format!("Failed to open {}", req.path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(req.key)
            .body(body)
            .metadata(NAME_METADATA_KEY, req.display_name)
            .content_type(req.content_type)
            .send()
            .await
            .with_context(|| format!("PutObject failed for {}", req.key))?;

        if let Some(obs) = observer {
            obs.on_progress(file_len, Some(file_len));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_file(
        &self,
        req: PutRequest<'_>,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<()> {
        let file_len = tokio::fs::metadata(req.path)
            .await
            .with_context(|| format!("Failed to read {}", req.path.display()))?
            .len();

        if let Some(obs) = observer {
            obs.on_progress(0, Some(file_len));
        }

        if self.multipart.use_multipart(file_len) {
            debug!("PUT {} ({} bytes, multipart)", req.key, file_len);
            let info = upload_file_multipart(
                &self.client,
                &self.bucket,
                &req,
                file_len,
                &self.multipart,
                observer,
            )
            .await?;
            debug!(
                "Multipart upload of {} done: {} bytes in {} parts, etag {:?}",
                req.key, info.total_bytes, info.parts, info.e_tag
            );
            Ok(())
        } else {
            debug!("PUT {} ({} bytes)", req.key, file_len);
            self.put_single(&req, file_len, observer).await
        }
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectHead>> {
        debug!("HEAD {}", key);
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(out) => Ok(Some(ObjectHead {
                metadata: out.metadata().cloned().unwrap_or_default(),
                content_length: out.content_length().and_then(|n| u64::try_from(n).ok()),
                content_type: out.content_type().map(str::to_string),
            })),
            Err(err)
                if err.as_service_error().is_some_and(HeadObjectError::is_not_found)
                    || is_not_found(&err) =>
            {
                Ok(None)
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("HeadObject failed for {}", key))),
        }
    }

    async fn list_page(&self, continuation_token: Option<&str>) -> Result<ListPage> {
        debug!("LIST {} (token: {:?})", self.bucket, continuation_token);
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .context("ListObjectsV2 failed")?;

        Ok(ListPage {
            keys: resp
                .contents()
                .iter()
                .filter_map(|obj| obj.key().map(str::to_string))
                .collect(),
            is_truncated: resp.is_truncated().unwrap_or(false),
            next_continuation_token: resp.next_continuation_token().map(str::to_string),
        })
    }

    async fn delete(&self, key: &str) -> Result<DeleteStatus> {
        debug!("DELETE {}", key);
        let result = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(DeleteStatus::Deleted),
            Err(err) if is_not_found(&err) => Ok(DeleteStatus::NotFound),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("DeleteObject failed for {}", key))),
        }
    }
}
