// src/config.rs
//
// Process-wide settings, loaded once at startup and passed by reference into
// every command handler.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DEFAULT_REGION, ENV_ACCESS_KEY_ID, ENV_BUCKET, ENV_DOWNLOAD_URL, ENV_ENDPOINT, ENV_REGION,
    ENV_SECRET_ACCESS_KEY, USER_ENV_FILE,
};

/// Missing or unusable settings. Detected before any command runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing Cloudflare R2 access key ID (set R2_ACCESS_KEY_ID)")]
    MissingAccessKeyId,

    #[error("Missing Cloudflare R2 secret access key (set R2_SECRET_ACCESS_KEY)")]
    MissingSecretAccessKey,

    #[error("Missing Cloudflare R2 endpoint (set R2_ENDPOINT)")]
    MissingEndpoint,

    #[error("Missing Cloudflare R2 bucket name (set R2_BUCKET)")]
    MissingBucket,

    #[error("Missing public download URL (set DOWNLOAD_URL)")]
    MissingDownloadUrl,
}

/// Credentials, endpoint and bucket for the single bucket this tool manages.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub bucket: String,
    /// Public base URL used for shareable links and downloads.
    pub download_url: Option<String>,
    pub region: String,
}

// Keep the secret out of `{:?}` output and debug logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("download_url", &self.download_url)
            .field("region", &self.region)
            .finish()
    }
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any name -> value lookup. Empty values count as missing.
    ///
    /// Required settings are checked in a fixed order so the first missing one
    /// is the one reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_key_id = get(ENV_ACCESS_KEY_ID).ok_or(ConfigError::MissingAccessKeyId)?;
        let secret_access_key =
            get(ENV_SECRET_ACCESS_KEY).ok_or(ConfigError::MissingSecretAccessKey)?;
        let endpoint = get(ENV_ENDPOINT).ok_or(ConfigError::MissingEndpoint)?;
        let bucket = get(ENV_BUCKET).ok_or(ConfigError::MissingBucket)?;

        Ok(Config {
            access_key_id,
            secret_access_key,
            endpoint,
            bucket,
            download_url: get(ENV_DOWNLOAD_URL),
            region: get(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }

    /// Public base URL, or an error when it was never configured.
    pub fn download_base(&self) -> Result<&str, ConfigError> {
        self.download_url
            .as_deref()
            .ok_or(ConfigError::MissingDownloadUrl)
    }

    /// Shareable link for `key`: `<download_url>/<key>`.
    pub fn object_url(&self, key: &str) -> Result<String, ConfigError> {
        Ok(join_url(self.download_base()?, key))
    }
}

/// `base` + `/` + `key`, without doubling a trailing slash on `base`.
pub fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Default per-user dotenv file (`~/.config/r2-files/.env`), if a home directory exists.
pub fn user_env_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(USER_ENV_FILE))
}

/// Load dotenv files into the process environment. Variables already set are
/// never overwritten, so the real environment always wins.
///
/// With `explicit` set only that file is read (and it must exist). Otherwise
/// the per-user file and then `./.env` are tried, both optional.
pub fn load_env_files(explicit: Option<&Path>) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(path) = explicit {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file: {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        return Ok(());
    }

    if let Some(path) = user_env_file() {
        if dotenvy::from_path(&path).is_ok() {
            debug!("Loaded settings from {}", path.display());
        }
    }
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded settings from {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_ACCESS_KEY_ID, "id"),
            (ENV_SECRET_ACCESS_KEY, "secret"),
            (ENV_ENDPOINT, "https://acct.r2.cloudflarestorage.com"),
            (ENV_BUCKET, "files"),
            (ENV_DOWNLOAD_URL, "https://files.example.com"),
        ]
    }

    #[test]
    fn test_complete_config() {
        let cfg = Config::from_lookup(lookup_from(&full())).unwrap();
        assert_eq!(cfg.bucket, "files");
        assert_eq!(cfg.region, DEFAULT_REGION);
        assert_eq!(cfg.download_base().unwrap(), "https://files.example.com");
    }

    #[test]
    fn test_missing_settings_reported_in_order() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingAccessKeyId);

        let mut pairs = full();
        pairs.retain(|(k, _)| *k != ENV_ENDPOINT && *k != ENV_BUCKET);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::MissingEndpoint);

        let mut pairs = full();
        pairs.retain(|(k, _)| *k != ENV_BUCKET);
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::MissingBucket);
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut pairs = full();
        pairs.retain(|(k, _)| *k != ENV_SECRET_ACCESS_KEY);
        pairs.push((ENV_SECRET_ACCESS_KEY, ""));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecretAccessKey);
    }

    #[test]
    fn test_download_url_optional_at_load() {
        let mut pairs = full();
        pairs.retain(|(k, _)| *k != ENV_DOWNLOAD_URL);
        let cfg = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.object_url("a.txt"), Err(ConfigError::MissingDownloadUrl));
    }

    #[test]
    fn test_object_url() {
        assert_eq!(join_url("https://x.dev", "k.png"), "https://x.dev/k.png");
        assert_eq!(join_url("https://x.dev/", "k.png"), "https://x.dev/k.png");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cfg = Config::from_lookup(lookup_from(&full())).unwrap();
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("secret\""));
        assert!(shown.contains("<redacted>"));
    }
}
