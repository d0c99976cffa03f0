// src/download.rs
//
// Download handler: fetch an object from its public URL and stream it to disk.

use std::path::{PathBuf, MAIN_SEPARATOR};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::join_url;

/// `dest_dir` joined with `file_name`, adding a separator only when missing:
/// `"dir"` and `"dir/"` both give `"dir/name"`.
pub fn destination_path(dest_dir: &str, file_name: &str) -> PathBuf {
    if dest_dir.ends_with('/') || dest_dir.ends_with(MAIN_SEPARATOR) {
        PathBuf::from(format!("{}{}", dest_dir, file_name))
    } else {
        PathBuf::from(format!("{}/{}", dest_dir, file_name))
    }
}

/// Statistics for a completed download
#[derive(Debug, Clone)]
pub struct DownloadStats {
    pub path: PathBuf,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

/// Fetches objects from the bucket's public base URL.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: reqwest::Client,
    base_url: String,
}

impl Downloader {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.to_string() }
    }

    /// Public URL for `key`.
    pub fn url_for(&self, key: &str) -> String {
        join_url(&self.base_url, key)
    }

    /// Download `key` into `dest_dir`, named `dest_name` or the key itself.
    ///
    /// The local file is created only once the server has answered with a
    /// success status.
    pub async fn download(
        &self,
        key: &str,
        dest_dir: &str,
        dest_name: Option<&str>,
    ) -> Result<DownloadStats> {
        let start = Instant::now();
        let url = self.url_for(key);
        let name = dest_name.filter(|n| !n.is_empty()).unwrap_or(key);
        let path = destination_path(dest_dir, name);
        debug!("GET {} -> {}", url, path.display());

        let mut resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Server refused {}", url))?;

        let mut file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = resp
            .chunk()
            .await
            .with_context(|| format!("Failed reading body of {}", url))?
        {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed writing {}", path.display()))?;
            total_bytes += chunk.len() as u64;
        }
        file.flush().await?;

        let elapsed = start.elapsed();
        info!("Downloaded {} bytes to {} in {:.2?}", total_bytes, path.display(), elapsed);
        Ok(DownloadStats { path, total_bytes, elapsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_path_adds_separator() {
        assert_eq!(destination_path("dir", "name"), PathBuf::from("dir/name"));
        assert_eq!(destination_path("dir/", "name"), PathBuf::from("dir/name"));
        assert_eq!(
            destination_path("path/to/download", "file.txt"),
            PathBuf::from("path/to/download/file.txt")
        );
    }

    #[test]
    fn test_url_for_key() {
        let d = Downloader::new("https://example.com");
        assert_eq!(d.url_for("file.txt"), "https://example.com/file.txt");
        let d = Downloader::new("https://example.com/");
        assert_eq!(d.url_for("file.txt"), "https://example.com/file.txt");
    }
}
