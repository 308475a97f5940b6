//! Run metadata.
//!
//! One row per batch run: inserted at start, completed with the final
//! counts when the run ends.

use std::sync::atomic::{AtomicU32, Ordering};

use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;

/// Metadata for a batch run, recorded at start.
pub struct RunMetadata<'a> {
    pub run_id: &'a str,
    pub start_time_ms: i64,
    pub version: &'a str,
}

/// Statistics for a completed batch run, recorded at end.
pub struct RunStats<'a> {
    pub run_id: &'a str,
    pub total_targets: i64,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub elapsed_seconds: f64,
}

/// Summary of a completed run, suitable for displaying run history.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique identifier for this run (e.g., "run_1765150444953").
    pub run_id: String,
    /// Crate version that performed the run.
    pub version: String,
    /// Start time as milliseconds since Unix epoch.
    pub start_time_ms: i64,
    /// End time as milliseconds since Unix epoch.
    pub end_time_ms: Option<i64>,
    /// Targets attempted.
    pub total_targets: i64,
    pub successful: i64,
    pub failed: i64,
    /// Targets never attempted because the run was cancelled.
    pub skipped: i64,
    /// Total execution time in seconds.
    pub elapsed_seconds: Option<f64>,
}

static RUN_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Builds a run identifier: `run_<start_millis>_<pid>_<seq>`.
///
/// The process id and a per-process counter keep runs started within the same
/// millisecond apart.
pub fn new_run_id(start_time_ms: i64) -> String {
    let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("run_{}_{}_{}", start_time_ms, std::process::id(), seq)
}

/// Inserts run metadata into the `runs` table.
///
/// # Errors
///
/// Fails if a run with the same `run_id` already exists, so two runs never
/// share a row or a dataset.
pub async fn insert_run_metadata(
    pool: &SqlitePool,
    meta: &RunMetadata<'_>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO runs (run_id, version, start_time_ms)
         VALUES (?, ?, ?)",
    )
    .bind(meta.run_id)
    .bind(meta.version)
    .bind(meta.start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Records the final counts of a run and marks it finished.
pub async fn update_run_stats(
    pool: &SqlitePool,
    stats: &RunStats<'_>,
) -> Result<(), DatabaseError> {
    let end_time_ms = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE runs
         SET end_time_ms = ?, total_targets = ?, successful = ?, failed = ?, skipped = ?, elapsed_seconds = ?
         WHERE run_id = ?",
    )
    .bind(end_time_ms)
    .bind(stats.total_targets)
    .bind(stats.successful)
    .bind(stats.failed)
    .bind(stats.skipped)
    .bind(stats.elapsed_seconds)
    .bind(stats.run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Returns finished runs, most recent first.
///
/// # Example
///
/// ```no_run
/// use profile_harvest::storage::query_run_history;
/// use sqlx::SqlitePool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite:./profile_harvest.db").await?;
/// for run in query_run_history(&pool, Some(10)).await? {
///     println!("Run {}: {} targets ({} succeeded, {} failed)",
///              run.run_id, run.total_targets, run.successful, run.failed);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn query_run_history(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<Vec<RunSummary>, DatabaseError> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit
        .and_then(|l| i64::try_from(l).ok())
        .unwrap_or(-1);

    let rows = sqlx::query(
        "SELECT run_id, version, start_time_ms, end_time_ms, total_targets, successful, failed, skipped, elapsed_seconds
         FROM runs
         WHERE end_time_ms IS NOT NULL
         ORDER BY start_time_ms DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(rows
        .into_iter()
        .map(|row| RunSummary {
            run_id: row.get("run_id"),
            version: row.get("version"),
            start_time_ms: row.get("start_time_ms"),
            end_time_ms: row.get("end_time_ms"),
            total_targets: row.get::<Option<i64>, _>("total_targets").unwrap_or(0),
            successful: row.get::<Option<i64>, _>("successful").unwrap_or(0),
            failed: row.get::<Option<i64>, _>("failed").unwrap_or(0),
            skipped: row.get::<Option<i64>, _>("skipped").unwrap_or(0),
            elapsed_seconds: row.get("elapsed_seconds"),
        })
        .collect())
}
