//! Progress logging utilities.

use log::info;

/// Logs progress after each processed target.
///
/// # Arguments
///
/// * `start_time` - When the batch started
/// * `successful` - Targets that produced a profile so far
/// * `failed` - Targets that failed so far
/// * `total` - Targets in the batch
pub fn log_progress(start_time: std::time::Instant, successful: usize, failed: usize, total: usize) {
    let completed = successful + failed;
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    // SAFETY: Cast from usize to f64 for a rate. Counts are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs * 60.0
    } else {
        0.0
    };
    info!(
        "Progress: {}/{} done ({} ok, {} failed) in {:.1}s (~{:.1} targets/min)",
        completed, total, successful, failed, elapsed_secs, rate
    );
}
