//! Error type definitions.
//!
//! This module defines the library error enums and the failure categories used to
//! classify item-level failures.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the logger with custom message (e.g., file creation).
    #[error("Logger initialization error: {0}")]
    LoggerSetupError(String),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Errors that cross the orchestrator boundary.
///
/// Everything else (fetch failures, report failures) is converted into data or a
/// log event inside the run.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The batch request is malformed. Raised before any target is fetched.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A record could not be persisted even after retrying.
    #[error("Failed to persist {record} after retries: {source}")]
    SinkWrite {
        /// Human-readable description of the record (target or "summary")
        record: String,
        /// The last sink error
        #[source]
        source: SinkError,
    },
}

/// Errors raised by a record sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// The record could not be encoded.
    #[error("Record serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The sink refused the write.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while generating the report artifact.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV encoding error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// I/O error while flushing the artifact.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Payload could not be encoded into a cell.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The exporter refused to produce an artifact.
    #[error("Report generation failed: {0}")]
    Failed(String),
}

/// Errors raised while storing a named artifact.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// The key cannot be mapped to a storage location.
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Item-level fetch failures raised by this crate (as opposed to transport errors).
///
/// These travel inside `anyhow::Error` chains and are recovered by
/// [`categorize_error`](super::categorize_error) via downcasting.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The target is not a usable http(s) URL.
    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    /// The response body exceeded the size limit.
    #[error("Response body too large: {size} bytes (limit {limit})")]
    BodyTooLarge {
        /// Observed size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// The page was fetched but contained nothing that looks like a profile.
    #[error("No profile data found at {0}")]
    NoProfileData(String),

    /// The whole item exceeded its processing budget.
    #[error("Item processing timed out after {0} seconds")]
    Timeout(u64),
}

/// Categories of item-level failures.
///
/// Each `ItemResult::Failure` carries one of these, and the run keeps a counter
/// per category for the final statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    InvalidTarget,
    Timeout,
    Connect,
    NotFound,
    Forbidden, // 401/403, typically a login wall or bot detection
    TooManyRequests,
    ServerError,
    HttpStatus, // Any other non-success status
    BodyTooLarge,
    NoProfileData,
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    /// Stable identifier stored in failure records.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidTarget => "invalid_target",
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::NotFound => "not_found",
            FailureKind::Forbidden => "forbidden",
            FailureKind::TooManyRequests => "too_many_requests",
            FailureKind::ServerError => "server_error",
            FailureKind::HttpStatus => "http_status",
            FailureKind::BodyTooLarge => "body_too_large",
            FailureKind::NoProfileData => "no_profile_data",
            FailureKind::Other => "other",
        }
    }

    /// Human-readable label used in the statistics log.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::InvalidTarget => "Invalid target URL",
            FailureKind::Timeout => "Timeout",
            FailureKind::Connect => "Connection error",
            FailureKind::NotFound => "Not Found (404)",
            FailureKind::Forbidden => "Forbidden (401/403)",
            FailureKind::TooManyRequests => "Too many requests (429)",
            FailureKind::ServerError => "Server error (5xx)",
            FailureKind::HttpStatus => "Other HTTP status",
            FailureKind::BodyTooLarge => "Response body too large",
            FailureKind::NoProfileData => "No profile data",
            FailureKind::Other => "Other error",
        }
    }
}
