//! Collaborator contracts used by the orchestrator.
//!
//! The orchestrator only ever talks to these traits. Concrete implementations
//! live in `fetch`, `storage` and `export`; tests supply in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error_handling::{ExportError, SinkError, StoreError};
use crate::models::{Credentials, DatasetRecord, ItemResult, ScrapingOptions};

/// Everything a fetcher may need besides the target itself.
#[derive(Debug, Clone, Copy)]
pub struct FetchContext<'a> {
    pub credentials: &'a Credentials,
    pub options: &'a ScrapingOptions,
    /// Zero-based position of the target in the batch.
    pub index: usize,
    /// Number of targets in the batch.
    pub total: usize,
}

/// Acquires the structured item for one target.
///
/// Any error is turned into a failure record by the orchestrator; its `{:#}`
/// rendering becomes the record's error message.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, target: &str, ctx: &FetchContext<'_>) -> anyhow::Result<Value>;
}

/// Append-only destination for finished records.
///
/// Writes may be retried by the caller, so duplicates are acceptable.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: &DatasetRecord) -> Result<(), SinkError>;
}

/// A generated report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Turns the ordered result list into a binary report.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn generate(&self, records: &[ItemResult]) -> Result<ReportArtifact, ExportError>;
}

/// Stores a single named binary artifact.
#[async_trait]
pub trait ValueStore: Send + Sync {
    async fn set_value(&self, name: &str, bytes: &[u8], content_type: &str)
        -> Result<(), StoreError>;
}

/// Pacing policy between two consecutive targets.
#[async_trait]
pub trait WaitPolicy: Send + Sync {
    async fn pause(&self, delay: Duration);
}
