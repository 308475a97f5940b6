//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{FailureKind, FailureStats};
use crate::models::BatchSummary;

/// Prints non-zero failure counts per category to the log.
pub fn print_failure_statistics(failure_stats: &FailureStats) {
    let total = failure_stats.total();
    if total == 0 {
        return;
    }

    info!("Failure Counts ({} total):", total);
    for kind in FailureKind::iter() {
        let count = failure_stats.get_count(kind);
        if count > 0 {
            info!("   {}: {}", kind.label(), count);
        }
    }
}

/// One-line, user-facing summary of a run.
pub fn format_summary_line(summary: &BatchSummary, elapsed_seconds: f64) -> String {
    let mut line = format!(
        "✅ Processed {} profile{} ({} succeeded, {} failed, {:.1}% success) in {:.1}s",
        summary.total_targets,
        if summary.total_targets == 1 { "" } else { "s" },
        summary.successful,
        summary.failed,
        summary.success_rate_percent,
        elapsed_seconds
    );
    if summary.cancelled {
        line.push_str(&format!(" - cancelled, {} skipped", summary.skipped));
    }
    line
}
