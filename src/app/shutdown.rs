//! Graceful shutdown handling.

use log::warn;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` when Ctrl-C is received.
///
/// The orchestrator notices the cancellation between targets, so the fetch in
/// flight is allowed to finish and everything already persisted stays valid.
/// The returned handle can be aborted once the run is over.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        warn!("Ctrl-C received, finishing the current target and stopping");
                        cancel.cancel();
                    }
                    Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}
