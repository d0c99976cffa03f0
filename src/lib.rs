// src/lib.rs
//
// Crate root: public re-exports used by src/bin/cli.rs and the tests.

pub mod constants;
pub mod config;
pub mod progress;
pub mod object_store;
pub mod s3_store;
pub mod multipart;
pub mod listing;
pub mod upload;
pub mod download;
pub mod delete;

pub use config::{Config, ConfigError};
pub use object_store::{DeleteStatus, ListPage, ObjectHead, ObjectStore, PutRequest, StoredObject};
pub use s3_store::S3Store;
pub use progress::{ConsoleProgress, ProgressObserver};

pub use listing::{list_all_objects, EMPTY_BUCKET_MESSAGE};
pub use upload::{upload_file, UploadOutcome, UploadRequest};
pub use download::{destination_path, Downloader};
pub use delete::{delete_all, delete_object, DeleteSummary};
