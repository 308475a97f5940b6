//! Batch orchestration.
//!
//! [`BatchOrchestrator::run`] walks the target list strictly in order, one fetch
//! at a time:
//!
//! 1. validate the request
//! 2. for each target: fetch, classify, persist, pause
//! 3. aggregate the summary
//! 4. optionally generate and store the report
//! 5. persist the summary as the terminal record
//!
//! Fetch failures become `ItemResult::Failure` records and never stop the loop.
//! Report failures are logged. Only invalid input and sink writes that keep
//! failing after retries are returned as errors.

mod pacing;
mod report;
mod summary;
mod traits;

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use tokio_retry::Retry;
use tokio_util::sync::CancellationToken;

use crate::app::log_progress;
use crate::error_handling::{categorize_error, BatchError, FailureStats, FetchError, RetryPolicy};
use crate::models::{now_iso8601, BatchRequest, BatchSummary, DatasetRecord, ItemResult};
use crate::utils::sanitize_and_truncate_error_message;

pub use pacing::TokioSleep;
pub use summary::{success_rate_percent, summarize};
pub use traits::{
    FetchContext, ItemFetcher, RecordSink, ReportArtifact, ReportExporter, ValueStore, WaitPolicy,
};

/// Report exporter and the store its artifact goes to.
struct ReportTarget {
    exporter: Arc<dyn ReportExporter>,
    store: Arc<dyn ValueStore>,
}

/// Drives a batch through its collaborators.
///
/// Built once per run with [`BatchOrchestrator::new`] and the `with_*` methods.
pub struct BatchOrchestrator {
    fetcher: Arc<dyn ItemFetcher>,
    sink: Arc<dyn RecordSink>,
    report: Option<ReportTarget>,
    wait_policy: Arc<dyn WaitPolicy>,
    cancel: CancellationToken,
    failure_stats: Arc<FailureStats>,
    sink_retry: RetryPolicy,
}

impl BatchOrchestrator {
    /// Creates an orchestrator with real-time pacing and no report target.
    pub fn new(fetcher: Arc<dyn ItemFetcher>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            fetcher,
            sink,
            report: None,
            wait_policy: Arc::new(TokioSleep),
            cancel: CancellationToken::new(),
            failure_stats: Arc::new(FailureStats::new()),
            sink_retry: RetryPolicy::sink_default(),
        }
    }

    /// Sets where the report is generated and stored.
    pub fn with_report(
        mut self,
        exporter: Arc<dyn ReportExporter>,
        store: Arc<dyn ValueStore>,
    ) -> Self {
        self.report = Some(ReportTarget { exporter, store });
        self
    }

    pub fn with_wait_policy(mut self, wait_policy: Arc<dyn WaitPolicy>) -> Self {
        self.wait_policy = wait_policy;
        self
    }

    /// Token checked between targets and during pauses, never mid-fetch.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_failure_stats(mut self, failure_stats: Arc<FailureStats>) -> Self {
        self.failure_stats = failure_stats;
        self
    }

    pub fn with_sink_retry(mut self, sink_retry: RetryPolicy) -> Self {
        self.sink_retry = sink_retry;
        self
    }

    pub fn failure_stats(&self) -> &Arc<FailureStats> {
        &self.failure_stats
    }

    /// Runs the batch and returns its summary.
    ///
    /// # Errors
    ///
    /// - [`BatchError::InvalidInput`] if the request has no targets; nothing is fetched.
    /// - [`BatchError::SinkWrite`] if a record cannot be persisted after retrying.
    pub async fn run(&self, request: &BatchRequest) -> Result<BatchSummary, BatchError> {
        if request.targets.is_empty() {
            return Err(BatchError::InvalidInput(
                "at least one target is required".to_string(),
            ));
        }

        let total = request.targets.len();
        let delay = request.options.delay();
        let start_time = Instant::now();
        let mut results: Vec<ItemResult> = Vec::with_capacity(total);
        let mut failed = 0usize;
        let mut cancelled = false;

        info!("Starting batch of {} target{}", total, if total == 1 { "" } else { "s" });

        for (index, target) in request.targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Cancellation requested, skipping {} remaining target(s)",
                    total - index
                );
                cancelled = true;
                break;
            }

            info!("Processing [{}/{}]: {}", index + 1, total, target);
            let result = self.process_target(request, index, target).await;
            match &result {
                ItemResult::Success { .. } => info!("Finished {target}"),
                ItemResult::Failure { error_message, .. } => {
                    failed += 1;
                    warn!("Failed to process {target}: {error_message}");
                }
            }

            if request.output_options.save_to_dataset {
                self.persist(&DatasetRecord::Item(result.clone())).await?;
            }
            results.push(result);
            log_progress(start_time, results.len() - failed, failed, total);

            if index + 1 < total && !delay.is_zero() {
                debug!("Waiting {} ms before the next target", delay.as_millis());
                tokio::select! {
                    _ = self.wait_policy.pause(delay) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }

        let mut summary = summarize(&results, total, cancelled);

        if request.output_options.generate_report {
            match &self.report {
                Some(target) => {
                    summary.report_file_name = report::generate_and_store_report(
                        target.exporter.as_ref(),
                        target.store.as_ref(),
                        &request.output_options.report_file_name,
                        &results,
                    )
                    .await;
                }
                None => warn!("Report generation requested but no report exporter is configured"),
            }
        }

        self.persist(&DatasetRecord::Summary {
            summary: summary.clone(),
        })
        .await?;

        info!(
            "Batch finished: {} total, {} succeeded, {} failed ({:.1}% success){}",
            summary.total_targets,
            summary.successful,
            summary.failed,
            summary.success_rate_percent,
            if summary.cancelled {
                format!(", {} skipped after cancellation", summary.skipped)
            } else {
                String::new()
            }
        );

        Ok(summary)
    }

    /// Fetches one target and classifies the outcome. Never fails.
    async fn process_target(&self, request: &BatchRequest, index: usize, target: &str) -> ItemResult {
        let ctx = FetchContext {
            credentials: &request.credentials,
            options: &request.options,
            index,
            total: request.targets.len(),
        };

        let timeout = request.options.item_timeout();
        let outcome = if timeout.is_zero() {
            self.fetcher.fetch(target, &ctx).await
        } else {
            match tokio::time::timeout(timeout, self.fetcher.fetch(target, &ctx)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(anyhow::Error::new(FetchError::Timeout(
                    request.options.item_timeout_secs,
                ))),
            }
        };

        match outcome {
            Ok(payload) => ItemResult::Success {
                target: target.to_string(),
                timestamp: now_iso8601(),
                payload,
            },
            Err(e) => {
                let kind = categorize_error(&e);
                self.failure_stats.increment(kind);
                ItemResult::Failure {
                    target: target.to_string(),
                    timestamp: now_iso8601(),
                    error_message: sanitize_and_truncate_error_message(&format!("{e:#}")),
                    error_type: kind.as_str().to_string(),
                }
            }
        }
    }

    /// Appends a record, retrying with exponential backoff.
    async fn persist(&self, record: &DatasetRecord) -> Result<(), BatchError> {
        let sink = &self.sink;

        Retry::spawn(self.sink_retry.strategy(), || async move {
            let outcome = sink.append(record).await;
            if let Err(ref e) = outcome {
                warn!("Failed to persist {}: {e}", record.describe());
            }
            outcome
        })
        .await
        .map_err(|source| BatchError::SinkWrite {
            record: record.describe(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::error_handling::{ExportError, FailureKind, SinkError, StoreError};
    use crate::models::{Credentials, OutputOptions, ScrapingOptions};

    struct ScriptedFetcher {
        fail: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ItemFetcher for ScriptedFetcher {
        async fn fetch(&self, target: &str, _ctx: &FetchContext<'_>) -> anyhow::Result<Value> {
            self.calls.lock().unwrap().push(target.to_string());
            if self.fail.contains(&target) {
                anyhow::bail!("timeout");
            }
            Ok(json!({ "name": target }))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<DatasetRecord>>,
    }

    #[async_trait]
    impl RecordSink for MemorySink {
        async fn append(&self, record: &DatasetRecord) -> Result<(), SinkError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingWait {
        pauses: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl WaitPolicy for RecordingWait {
        async fn pause(&self, delay: Duration) {
            self.pauses.lock().unwrap().push(delay);
        }
    }

    struct FailingExporter;

    #[async_trait]
    impl ReportExporter for FailingExporter {
        async fn generate(&self, _records: &[ItemResult]) -> Result<ReportArtifact, ExportError> {
            Err(ExportError::Failed("disk on fire".into()))
        }
    }

    struct NullStore;

    #[async_trait]
    impl ValueStore for NullStore {
        async fn set_value(&self, _: &str, _: &[u8], _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn request(targets: &[&str], delay_ms: u64) -> BatchRequest {
        BatchRequest {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            options: ScrapingOptions {
                delay_between_requests_ms: delay_ms,
                ..Default::default()
            },
            output_options: OutputOptions::default(),
            credentials: Credentials::default(),
        }
    }

    fn fetcher(fail: Vec<&'static str>) -> Arc<ScriptedFetcher> {
        Arc::new(ScriptedFetcher {
            fail,
            calls: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_run_classifies_each_target_in_order() {
        let fetcher = fetcher(vec!["B"]);
        let sink = Arc::new(MemorySink::default());
        let orchestrator = BatchOrchestrator::new(fetcher.clone(), sink.clone());

        let summary = orchestrator.run(&request(&["A", "B", "C"], 0)).await.unwrap();

        assert_eq!(summary.total_targets, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.success_rate_percent, 66.7);

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 4);
        let targets: Vec<_> = records[..3]
            .iter()
            .map(|r| match r {
                DatasetRecord::Item(item) => item.target().to_string(),
                DatasetRecord::Summary { .. } => panic!("summary before items"),
            })
            .collect();
        assert_eq!(targets, vec!["A", "B", "C"]);
        match &records[1] {
            DatasetRecord::Item(item) => assert_eq!(item.error_message(), Some("timeout")),
            _ => unreachable!(),
        }
        assert!(matches!(records[3], DatasetRecord::Summary { .. }));
        assert_eq!(orchestrator.failure_stats().get_count(FailureKind::Other), 1);
    }

    #[tokio::test]
    async fn test_run_rejects_empty_request_without_fetching() {
        let fetcher = fetcher(vec![]);
        let sink = Arc::new(MemorySink::default());
        let orchestrator = BatchOrchestrator::new(fetcher.clone(), sink.clone());

        let err = orchestrator.run(&request(&[], 0)).await.unwrap_err();
        assert!(matches!(err, BatchError::InvalidInput(_)));
        assert!(fetcher.calls.lock().unwrap().is_empty());
        assert!(sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pauses_only_between_targets() {
        let wait = Arc::new(RecordingWait::default());
        let orchestrator =
            BatchOrchestrator::new(fetcher(vec![]), Arc::new(MemorySink::default()))
                .with_wait_policy(wait.clone());

        orchestrator.run(&request(&["A", "B", "C", "D"], 1500)).await.unwrap();

        let pauses = wait.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 3);
        assert!(pauses.iter().all(|d| *d == Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn test_single_target_never_pauses() {
        let wait = Arc::new(RecordingWait::default());
        let orchestrator =
            BatchOrchestrator::new(fetcher(vec![]), Arc::new(MemorySink::default()))
                .with_wait_policy(wait.clone());

        orchestrator.run(&request(&["A"], 1500)).await.unwrap();
        assert!(wait.pauses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_delay_never_pauses() {
        let wait = Arc::new(RecordingWait::default());
        let orchestrator =
            BatchOrchestrator::new(fetcher(vec![]), Arc::new(MemorySink::default()))
                .with_wait_policy(wait.clone());

        orchestrator.run(&request(&["A", "B"], 0)).await.unwrap();
        assert!(wait.pauses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_failure_does_not_change_counts() {
        let orchestrator =
            BatchOrchestrator::new(fetcher(vec!["B"]), Arc::new(MemorySink::default()))
                .with_report(Arc::new(FailingExporter), Arc::new(NullStore));

        let summary = orchestrator.run(&request(&["A", "B"], 0)).await.unwrap();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.report_file_name.is_none());
    }

    #[tokio::test]
    async fn test_save_to_dataset_false_only_persists_summary() {
        let sink = Arc::new(MemorySink::default());
        let orchestrator = BatchOrchestrator::new(fetcher(vec![]), sink.clone());
        let mut req = request(&["A", "B"], 0);
        req.output_options.save_to_dataset = false;

        orchestrator.run(&req).await.unwrap();
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], DatasetRecord::Summary { .. }));
    }

    #[tokio::test]
    async fn test_item_timeout_becomes_failure() {
        struct SlowFetcher;

        #[async_trait]
        impl ItemFetcher for SlowFetcher {
            async fn fetch(&self, _: &str, _: &FetchContext<'_>) -> anyhow::Result<Value> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(json!({}))
            }
        }

        let sink = Arc::new(MemorySink::default());
        let orchestrator = BatchOrchestrator::new(Arc::new(SlowFetcher), sink.clone());
        let mut req = request(&["A"], 0);
        req.options.item_timeout_secs = 1;

        let summary = orchestrator.run(&req).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(orchestrator.failure_stats().get_count(FailureKind::Timeout), 1);
        let records = sink.records.lock().unwrap();
        match &records[0] {
            DatasetRecord::Item(ItemResult::Failure { error_type, .. }) => {
                assert_eq!(error_type, "timeout")
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }
}
