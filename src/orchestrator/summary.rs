//! Aggregation of item results into a [`BatchSummary`].

use crate::models::{now_iso8601, BatchSummary, ItemResult};

/// `100 * successful / total`, rounded to one decimal. Zero when `total` is zero.
pub fn success_rate_percent(successful: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // SAFETY: Cast from usize to f64 for a percentage. Counts are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    let rate = 1000.0 * successful as f64 / total as f64;
    rate.round() / 10.0
}

/// Builds the summary of a run.
///
/// `requested` is the length of the target list; anything not attempted is
/// reported as skipped.
pub fn summarize(results: &[ItemResult], requested: usize, cancelled: bool) -> BatchSummary {
    let total_targets = results.len();
    let successful = results.iter().filter(|r| r.is_success()).count();
    let failed = total_targets - successful;

    BatchSummary {
        total_targets,
        successful,
        failed,
        success_rate_percent: success_rate_percent(successful, total_targets),
        finished_at: now_iso8601(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        skipped: requested.saturating_sub(total_targets),
        cancelled,
        report_file_name: None,
    }
}
