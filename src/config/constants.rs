//! Configuration constants.
//!
//! This module defines the defaults and limits used throughout the application:
//! pacing, timeouts, retry strategy, size limits and storage paths.

use std::time::Duration;

/// Default delay between two consecutive targets, in milliseconds.
pub const DEFAULT_DELAY_BETWEEN_REQUESTS_MS: u64 = 2000;

/// Default upper bound on a single fetch (including its internal retries), in seconds.
pub const DEFAULT_ITEM_TIMEOUT_SECS: u64 = 90;

/// Per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

pub const DB_PATH: &str = "./profile_harvest.db";

/// Prefix of the default report file name. The UTC date and `.csv` are appended.
pub const REPORT_FILE_PREFIX: &str = "profiles-report";

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Response and body size limits
/// Maximum response body size in bytes (2MB)
/// Responses larger than this are rejected to prevent memory exhaustion
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Maximum target URL length (2048 characters).
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum error message length stored in a failure record.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;

// Fetch retry strategy
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 20;
/// Maximum number of retries after the first attempt
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// Record sink retry strategy
/// Initial delay in milliseconds before retrying a failed sink write
pub const SINK_RETRY_INITIAL_DELAY_MS: u64 = 200;
/// Maximum number of retries for a failed sink write
pub const SINK_RETRY_MAX_ATTEMPTS: usize = 3;

// HTTP status codes
/// HTTP 429 Too Many Requests
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Upper bound on the final WAL checkpoint.
pub const WAL_CHECKPOINT_TIMEOUT: Duration = Duration::from_secs(10);
