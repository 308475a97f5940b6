//! Best-effort report generation.
//!
//! Failures here are logged and swallowed: they never change item counts and
//! never fail the run.

use log::{info, warn};

use super::traits::{ReportExporter, ValueStore};
use crate::models::ItemResult;

/// Generates the report for `results` and stores it under `name`.
///
/// Returns the key the report was stored under, or `None` if either step failed.
pub(crate) async fn generate_and_store_report(
    exporter: &dyn ReportExporter,
    store: &dyn ValueStore,
    name: &str,
    results: &[ItemResult],
) -> Option<String> {
    let artifact = match exporter.generate(results).await {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!("Report generation failed, continuing without a report: {e}");
            return None;
        }
    };

    match store
        .set_value(name, &artifact.bytes, &artifact.content_type)
        .await
    {
        Ok(()) => {
            info!(
                "Report saved as '{}' ({} bytes, {})",
                name,
                artifact.bytes.len(),
                artifact.content_type
            );
            Some(name.to_string())
        }
        Err(e) => {
            warn!("Failed to store report '{name}': {e}");
            None
        }
    }
}
