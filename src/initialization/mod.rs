//! Application initialization.
//!
//! This module provides functions to initialize shared resources:
//! - Logger (stderr or file, plain or JSON)
//! - HTTP client

mod client;
mod logger;

// Re-export public API
pub use client::{build_client, init_client};
pub use logger::{init_logger_to_file, init_logger_with};
