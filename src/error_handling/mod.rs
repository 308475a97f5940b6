//! Error handling and failure statistics.
//!
//! This module provides:
//! - Error type definitions for every failure domain of a run
//! - Failure categorization from `anyhow` error chains
//! - Retry strategy configuration for fetches and record sink writes
//! - Per-category failure counters
//!
//! Only [`BatchError`] crosses the orchestrator boundary. Fetch failures become
//! failure records, report failures become log events.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub(crate) use categorization::is_retriable_error;
pub use categorization::{
    categorize_error, categorize_reqwest_error, categorize_status, RetryPolicy,
};
pub use stats::FailureStats;
pub use types::{
    BatchError, DatabaseError, ExportError, FailureKind, FetchError, InitializationError,
    SinkError, StoreError,
};
