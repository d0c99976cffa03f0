// src/constants.rs
//
// Centralized constants for r2-files to avoid hardcoded values throughout the codebase

/// Object metadata key holding the original (display) file name.
pub const NAME_METADATA_KEY: &str = "name";

/// Content type used when the file name gives no hint.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Region passed to the SDK. R2 ignores it but the signer needs one.
pub const DEFAULT_REGION: &str = "auto";

// ============================================================================
// Environment variables
// ============================================================================

pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
pub const ENV_ENDPOINT: &str = "R2_ENDPOINT";
pub const ENV_BUCKET: &str = "R2_BUCKET";
pub const ENV_DOWNLOAD_URL: &str = "DOWNLOAD_URL";
pub const ENV_REGION: &str = "R2_REGION";

/// Per-user dotenv location, relative to the home directory.
pub const USER_ENV_FILE: &str = ".config/r2-files/.env";

// ============================================================================
// Upload sizing
// ============================================================================

/// Files at or above this size go through multipart upload (32 MB)
pub const DEFAULT_S3_MULTIPART_THRESHOLD: u64 = 32 * 1024 * 1024;

/// Default multipart upload part size (16 MB)
pub const DEFAULT_S3_MULTIPART_PART_SIZE: u64 = 16 * 1024 * 1024;

/// Minimum S3 multipart upload part size (5 MB - AWS requirement)
pub const MIN_S3_MULTIPART_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of parts in a multipart upload
pub const MAX_MULTIPART_PARTS: u64 = 10_000;

/// Default number of parts uploaded concurrently
pub const DEFAULT_CONCURRENT_UPLOADS: usize = 4;

// ============================================================================
// Delete-all fan-out
// ============================================================================

/// Default number of DeleteObject calls in flight during `delete-all`
pub const DEFAULT_DELETE_JOBS: usize = 32;
