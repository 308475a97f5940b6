// Shared test helpers for database setup and collaborator fakes.
//
// Each integration test file pulls this in with `mod helpers;`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use profile_harvest::error_handling::{SinkError, StoreError};
use profile_harvest::models::{Credentials, OutputOptions, ScrapingOptions};
use profile_harvest::{run_migrations, BatchRequest, DatasetRecord, RecordSink, ValueStore, WaitPolicy};

/// Creates an in-memory database with migrations applied.
///
/// Limited to one connection: every `sqlite::memory:` connection is its own database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A request over `targets` with the given delay and default everything else.
pub fn request(targets: &[&str], delay_ms: u64) -> BatchRequest {
    BatchRequest {
        targets: targets.iter().map(|t| t.to_string()).collect(),
        options: ScrapingOptions {
            delay_between_requests_ms: delay_ms,
            ..Default::default()
        },
        output_options: OutputOptions {
            report_file_name: "report.csv".to_string(),
            ..Default::default()
        },
        credentials: Credentials::default(),
    }
}

/// Keeps every appended record in memory.
#[derive(Default)]
pub struct MemorySink {
    pub records: Mutex<Vec<DatasetRecord>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<DatasetRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, record: &DatasetRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Fails the first `failures` appends, then behaves like [`MemorySink`].
pub struct FlakySink {
    pub failures: AtomicUsize,
    pub attempts: AtomicUsize,
    pub inner: MemorySink,
}

impl FlakySink {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
            inner: MemorySink::default(),
        }
    }
}

#[async_trait]
impl RecordSink for FlakySink {
    async fn append(&self, record: &DatasetRecord) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SinkError::Unavailable("database is locked".to_string()));
        }
        self.inner.append(record).await
    }
}

/// Records requested pauses without sleeping.
#[derive(Default)]
pub struct RecordingWait {
    pub pauses: Mutex<Vec<Duration>>,
}

impl RecordingWait {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl WaitPolicy for RecordingWait {
    async fn pause(&self, delay: Duration) {
        self.pauses.lock().unwrap().push(delay);
    }
}

/// Keeps stored artifacts in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub values: Mutex<Vec<(String, Vec<u8>, String)>>,
}

#[async_trait]
impl ValueStore for MemoryStore {
    async fn set_value(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .push((name.to_string(), bytes.to_vec(), content_type.to_string()));
        Ok(())
    }
}

/// Minimal profile page with a JSON-LD `Person` block.
pub fn profile_html(name: &str) -> String {
    format!(
        r#"<html><head>
<title>{name} - Engineer | LinkedIn</title>
<script type="application/ld+json">{{"@type": "Person", "name": "{name}", "jobTitle": "Engineer"}}</script>
</head><body></body></html>"#
    )
}
