// src/upload.rs
//
// Upload handler: choose a collision-free key, send the file, build the link.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::DEFAULT_CONTENT_TYPE;
use crate::object_store::{ObjectStore, PutRequest};
use crate::progress::ProgressObserver;

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub local_path: PathBuf,
    /// Base name of `local_path`, stored as the object's `name` metadata.
    pub display_name: String,
    /// Extension of `display_name` including the dot, or empty.
    pub extension: String,
    /// Requested key without extension.
    pub desired_stem: Option<String>,
}

impl UploadRequest {
    /// Derive display name and extension from `local_path`. An empty
    /// `desired_stem` is the same as none.
    pub fn new(local_path: impl Into<PathBuf>, desired_stem: Option<String>) -> Result<Self> {
        let local_path = local_path.into();
        let display_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Invalid file path: {}", local_path.display()))?
            .to_string();
        let extension = file_extension(&display_name).to_string();

        Ok(Self {
            local_path,
            display_name,
            extension,
            desired_stem: desired_stem.filter(|s| !s.is_empty()),
        })
    }

    /// `desired_stem + extension`, if a stem was given.
    pub fn desired_key(&self) -> Option<String> {
        self.desired_stem
            .as_ref()
            .map(|stem| format!("{}{}", stem, self.extension))
    }

    pub fn content_type(&self) -> &'static str {
        mime_guess::from_path(&self.display_name)
            .first_raw()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Extension of a file name, dot included: `"cat.png"` -> `".png"`.
/// Names without a dot, or whose only dot leads (`.bashrc`), have none.
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[i..],
        _ => "",
    }
}

/// Fresh random key: `<uuid-v4><extension>`.
pub fn generate_key(extension: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension)
}

/// The key chosen for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: String,
    /// The desired key that was already taken, when we fell back.
    pub collided_with: Option<String>,
}

/// Use the desired key when it is free, otherwise a generated one.
/// A taken key is never an error.
pub async fn resolve_key(store: &dyn ObjectStore, req: &UploadRequest) -> Result<ResolvedKey> {
    let Some(desired) = req.desired_key() else {
        return Ok(ResolvedKey { key: generate_key(&req.extension), collided_with: None });
    };

    let taken = store
        .exists(&desired)
        .await
        .context("Error checking object existence")?;
    if !taken {
        return Ok(ResolvedKey { key: desired, collided_with: None });
    }

    warn!(
        "Object with key \"{}\" already exists in bucket \"{}\"",
        desired,
        store.bucket()
    );
    warn!("Defaulting to UUID key.");
    Ok(ResolvedKey {
        key: generate_key(&req.extension),
        collided_with: Some(desired),
    })
}

/// What a finished upload produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub key: String,
    pub collided_with: Option<String>,
    /// Shareable link, absent when no download URL is configured.
    pub url: Option<String>,
}

/// Upload `req` under a collision-free key and build its download link.
pub async fn upload_file(
    store: &dyn ObjectStore,
    cfg: &Config,
    req: &UploadRequest,
    observer: Option<&dyn ProgressObserver>,
) -> Result<UploadOutcome> {
    ensure_regular_file(&req.local_path).await?;

    let resolved = resolve_key(store, req).await?;
    info!("Uploading {} as {}", req.local_path.display(), resolved.key);

    store
        .put_file(
            PutRequest {
                key: &resolved.key,
                path: &req.local_path,
                display_name: &req.display_name,
                content_type: req.content_type(),
            },
            observer,
        )
        .await?;

    Ok(UploadOutcome {
        url: cfg.object_url(&resolved.key).ok(),
        key: resolved.key,
        collided_with: resolved.collided_with,
    })
}

async fn ensure_regular_file(path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    Ok(())
}

/// Put `url` on the system clipboard.
pub fn copy_to_clipboard(url: &str) -> Result<()> {
    cli_clipboard::set_contents(url.to_string())
        .map_err(|e| anyhow!("Failed to copy link to clipboard: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("cat.png"), ".png");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".bashrc"), "");
        assert_eq!(file_extension("trailing."), ".");
    }

    #[test]
    fn test_request_from_path() {
        let req = UploadRequest::new("path/to/file.txt", Some("notes".into())).unwrap();
        assert_eq!(req.display_name, "file.txt");
        assert_eq!(req.extension, ".txt");
        assert_eq!(req.desired_key().as_deref(), Some("notes.txt"));
        assert_eq!(req.content_type(), "text/plain");
    }

    #[test]
    fn test_empty_desired_name_is_ignored() {
        let req = UploadRequest::new("file.txt", Some(String::new())).unwrap();
        assert_eq!(req.desired_stem, None);
        assert_eq!(req.desired_key(), None);
    }

    #[test]
    fn test_unknown_type_defaults_to_octet_stream() {
        let req = UploadRequest::new("blob.zzzunknown", None).unwrap();
        assert_eq!(req.content_type(), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_key(".png");
        assert!(key.ends_with(".png"));
        let id = Uuid::parse_str(key.trim_end_matches(".png")).unwrap();
        assert_eq!(id.get_version_num(), 4);
        assert_eq!(key.len(), 36 + 4);
    }

    #[test]
    fn test_path_without_file_name_rejected() {
        assert!(UploadRequest::new("..", None).is_err());
    }
}
