//! Main application modules.
//!
//! This module provides progress logging, shutdown handling and statistics
//! printing used by the orchestrator and the binary.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::cancel_on_ctrl_c;
pub use statistics::{format_summary_line, print_failure_statistics};
