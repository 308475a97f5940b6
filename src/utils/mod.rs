//! Utility functions.
//!
//! This module provides:
//! - String sanitization for error messages and storage keys
//! - CSS selector parsing with a safe fallback

pub mod sanitize;
mod selector;

pub use sanitize::{sanitize_and_truncate_error_message, sanitize_key};
pub use selector::parse_selector_with_fallback;
