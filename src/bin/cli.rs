// src/bin/cli.rs
//
//! CLI supporting `upload`, `download`, `delete`, `delete-all` and `list`
//! against one S3-compatible bucket.
//!
//! Examples:
//! ```bash
//! r2-files upload      ./cat.png                 # random key, e.g. 3f2b...c1.png
//! r2-files upload      ./cat.png kitty           # key kitty.png, unless taken
//! r2-files download    kitty.png ~/Downloads     # -> ~/Downloads/kitty.png
//! r2-files download    kitty.png ~/Downloads c.png
//! r2-files delete      kitty.png
//! r2-files delete-all  -y
//! r2-files list
//! ```

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use r2files::config::load_env_files;
use r2files::constants::DEFAULT_DELETE_JOBS;
use r2files::delete::summary_lines;
use r2files::listing::listing_lines;
use r2files::upload::copy_to_clipboard;
use r2files::{
    delete_all, delete_object, list_all_objects, upload_file, Config, ConsoleProgress,
    Downloader, S3Store, UploadRequest,
};

/// Macro to safely print with broken pipe handling
macro_rules! safe_println {
    ($($arg:tt)*) => {
        match writeln!(io::stdout(), $($arg)*) {
            Ok(_) => {},
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                // Gracefully exit on broken pipe (e.g., when piped to head/tail)
                std::process::exit(0);
            }
            Err(e) => return Err(e.into())
        }
    };
}

// -- Commands

#[derive(Parser)]
#[command(name = "r2-files", author, version, about)]
struct Cli {
    /// Turn on verbose logging, counts the number of v's
    #[arg(short = 'v',
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity: -v = Info, -vv = Debug",
    )]
    verbose: u8,

    /// Read settings from this dotenv file instead of ~/.config/r2-files/.env and ./.env
    #[arg(long = "env-file", value_name = "FILE", global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download an object into a local directory.
    Download {
        /// Key of the object to download
        key: String,
        /// Directory to write into
        dest_dir: String,
        /// Local file name (defaults to the key)
        dest_name: Option<String>,
    },

    /// Upload a local file; the download link is printed and copied to the clipboard.
    Upload {
        /// File to upload
        file_path: PathBuf,
        /// Desired key without extension; a random key is used if omitted or taken
        desired_name: Option<String>,
    },

    /// Delete one object.
    Delete {
        /// Key of the object to delete
        key: String,
    },

    /// Delete every object in the bucket.
    #[command(name = "delete-all")]
    DeleteAll {
        /// Confirm deleting everything (required)
        #[arg(short = 'y', long = "yes")]
        yes: bool,

        /// Maximum concurrent delete requests.
        #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_DELETE_JOBS)]
        jobs: usize,
    },

    /// List every object with its original file name.
    List,
}

// -----------------------------------------------------------------------------
// Command implementations
// -----------------------------------------------------------------------------

async fn upload_cmd(
    store: &S3Store,
    cfg: &Config,
    file_path: &Path,
    desired_name: Option<String>,
) -> Result<()> {
    let req = UploadRequest::new(file_path, desired_name)?;
    let progress = ConsoleProgress::new();
    let result = upload_file(store, cfg, &req, Some(&progress)).await;
    progress.finish();
    let outcome = result?;

    safe_println!("Upload successful: {}", outcome.key);
    match &outcome.url {
        Some(url) => {
            safe_println!("{}", url);
            if let Err(e) = copy_to_clipboard(url) {
                warn!("{:#}", e);
            }
        }
        None => warn!("DOWNLOAD_URL is not set; no download link was created"),
    }
    Ok(())
}

async fn download_cmd(
    cfg: &Config,
    key: &str,
    dest_dir: &str,
    dest_name: Option<&str>,
) -> Result<()> {
    let downloader = Downloader::new(cfg.download_base()?);
    match downloader.download(key, dest_dir, dest_name).await {
        Ok(stats) => {
            safe_println!("Downloaded {} ({} bytes)", stats.path.display(), stats.total_bytes);
            Ok(())
        }
        Err(e) => Err(e.context("Error downloading file")),
    }
}

async fn delete_cmd(store: &S3Store, key: &str) -> Result<()> {
    let status = delete_object(store, key).await?;
    safe_println!("{}", status.message());
    Ok(())
}

async fn delete_all_cmd(store: &S3Store, jobs: usize) -> Result<()> {
    let summary = delete_all(store, jobs).await?;
    for line in summary_lines(summary.as_ref()) {
        safe_println!("{}", line);
    }
    if let Some(summary) = summary.filter(|s| !s.is_success()) {
        bail!("{} object(s) could not be deleted", summary.failures.len());
    }
    Ok(())
}

async fn list_cmd(store: &S3Store) -> Result<()> {
    let objects = list_all_objects(store).await?;
    for line in listing_lines(objects.as_deref()) {
        safe_println!("{}", line);
    }
    Ok(())
}

/// Main CLI function
#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit 1; --help / --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize tracing subscriber based on verbosity
    let filter = match cli.verbose {
        0 => "warn",        // no -v: WARN level
        1 => "info",        // -v: INFO level
        _ => "debug",       // -vv or more: DEBUG level
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    // Settings are checked before any command runs.
    load_env_files(cli.env_file.as_deref())?;
    let cfg = Config::from_env()?;
    info!("Using bucket {} at {}", cfg.bucket, cfg.endpoint);

    match cli.cmd {
        Command::Download { key, dest_dir, dest_name } => {
            download_cmd(&cfg, &key, &dest_dir, dest_name.as_deref()).await?
        }

        Command::Upload { file_path, desired_name } => {
            let store = S3Store::from_config(&cfg).await;
            upload_cmd(&store, &cfg, &file_path, desired_name).await?
        }

        Command::Delete { key } => {
            let store = S3Store::from_config(&cfg).await;
            delete_cmd(&store, &key).await?
        }

        Command::DeleteAll { yes, jobs } => {
            if !yes {
                eprintln!("Usage: r2-files delete-all -y");
                std::process::exit(1);
            }
            let store = S3Store::from_config(&cfg).await;
            delete_all_cmd(&store, jobs).await?
        }

        Command::List => {
            let store = S3Store::from_config(&cfg).await;
            list_cmd(&store).await?
        }
    }

    Ok(())
}
