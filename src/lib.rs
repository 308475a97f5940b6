//! profile_harvest library: sequential profile collection
//!
//! This library drives a batch of profile URLs through a fetcher one at a time,
//! pacing between requests, recording every outcome as a dataset record and
//! producing a summary plus an optional CSV report.
//!
//! The core is [`BatchOrchestrator`]; its collaborators are traits
//! ([`ItemFetcher`], [`RecordSink`], [`ReportExporter`], [`ValueStore`],
//! [`WaitPolicy`]) with production implementations backed by `reqwest`,
//! SQLite and the filesystem.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use profile_harvest::{run_batch, Cli};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cli = Cli::parse_from(["profile_harvest", "input.json"]);
//! let report = run_batch(&cli).await?;
//! println!("Processed {} profiles: {} succeeded, {} failed",
//!          report.summary.total_targets, report.summary.successful, report.summary.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
pub mod error_handling;
pub mod export;
pub mod fetch;
pub mod initialization;
pub mod input;
pub mod models;
pub mod orchestrator;
pub mod parse;
pub mod storage;
mod utils;

// Re-export public API
pub use app::format_summary_line;
pub use config::{Cli, LogFormat, LogLevel};
pub use error_handling::{BatchError, FailureKind, FailureStats, RetryPolicy};
pub use models::{BatchRequest, BatchSummary, DatasetRecord, ItemResult};
pub use orchestrator::{
    BatchOrchestrator, FetchContext, ItemFetcher, RecordSink, ReportArtifact, ReportExporter,
    TokioSleep, ValueStore, WaitPolicy,
};
pub use run::{run_batch, RunReport};
pub use storage::{query_run_history, run_migrations, RunSummary};

// Internal run module (wires the production collaborators together)
mod run {
    use anyhow::{Context, Result};
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::Arc;

    use log::{info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::app::{cancel_on_ctrl_c, print_failure_statistics};
    use crate::config::Cli;
    use crate::export::CsvReportExporter;
    use crate::fetch::HttpProfileFetcher;
    use crate::initialization::init_client;
    use crate::input::{load_input, log_input_summary, parse_batch_request};
    use crate::models::BatchSummary;
    use crate::orchestrator::{BatchOrchestrator, ValueStore};
    use crate::storage::{
        checkpoint_wal, init_db_pool_with_path, insert_run_metadata, new_run_id, run_migrations,
        update_run_stats, DirectoryValueStore, RunMetadata, RunStats, SqliteRecordSink,
        SqliteValueStore,
    };

    /// Results of a batch run.
    #[derive(Debug, Clone)]
    pub struct RunReport {
        /// Summary persisted as the terminal dataset record
        pub summary: BatchSummary,
        /// Path to the SQLite database containing the dataset
        pub db_path: PathBuf,
        /// Directory the report was written to, when not stored in the database
        pub report_dir: Option<PathBuf>,
        /// Run identifier (format: `run_<timestamp_millis>_<pid>_<seq>`)
        pub run_id: String,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs a batch described by the CLI arguments.
    ///
    /// Reads and validates the input, opens the database, fetches every target
    /// in order and records the run. Ctrl-C stops the batch after the target in
    /// flight.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The input cannot be read or is invalid (no fetch happens)
    /// - Database initialization fails
    /// - The HTTP client cannot be built
    /// - A dataset record cannot be persisted after retrying
    pub async fn run_batch(cli: &Cli) -> Result<RunReport> {
        let input = load_input(&cli.input).await?;
        let mut request = parse_batch_request(&input)?;
        if let Some(delay_ms) = cli.delay_ms {
            request.options.delay_between_requests_ms = delay_ms;
        }
        log_input_summary(&request);

        let pool = init_db_pool_with_path(&cli.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let client = init_client(cli).context("Failed to initialize HTTP client")?;

        let start_time_epoch = Utc::now().timestamp_millis();
        let run_id = new_run_id(start_time_epoch);
        info!("Starting run: {run_id}");
        insert_run_metadata(
            &pool,
            &RunMetadata {
                run_id: &run_id,
                start_time_ms: start_time_epoch,
                version: env!("CARGO_PKG_VERSION"),
            },
        )
        .await
        .context("Failed to insert run metadata")?;

        let sink = Arc::new(SqliteRecordSink::new(Arc::clone(&pool), run_id.clone()));
        let store: Arc<dyn ValueStore> = match &cli.report_dir {
            Some(dir) => Arc::new(DirectoryValueStore::new(dir.clone())),
            None => Arc::new(SqliteValueStore::new(Arc::clone(&pool), run_id.clone())),
        };
        let fetcher = Arc::new(HttpProfileFetcher::new(client));

        let cancel = CancellationToken::new();
        let ctrl_c = cancel_on_ctrl_c(cancel.clone());

        let orchestrator = BatchOrchestrator::new(fetcher, sink)
            .with_report(Arc::new(CsvReportExporter::new()), store)
            .with_cancellation(cancel.clone());

        let start_time = std::time::Instant::now();
        let outcome = orchestrator.run(&request).await;
        cancel.cancel();
        ctrl_c.abort();
        let summary = outcome?;
        let elapsed_seconds = start_time.elapsed().as_secs_f64();

        // Records and summary are already persisted; run bookkeeping is best-effort.
        if let Err(e) = update_run_stats(
            &pool,
            &RunStats {
                run_id: &run_id,
                total_targets: summary.total_targets as i64,
                successful: summary.successful as i64,
                failed: summary.failed as i64,
                skipped: summary.skipped as i64,
                elapsed_seconds,
            },
        )
        .await
        {
            warn!("Failed to update run statistics for {run_id}: {e}");
        }

        checkpoint_wal(&pool).await;

        print_failure_statistics(orchestrator.failure_stats());

        Ok(RunReport {
            summary,
            db_path: cli.db_path.clone(),
            report_dir: cli.report_dir.clone(),
            run_id,
            elapsed_seconds,
        })
    }
}
