//! Failure statistics tracking.
//!
//! Counts item-level failures per category during a batch run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FailureKind;

/// Thread-safe failure statistics tracker.
///
/// Uses atomic counters so the tracker can be shared behind an `Arc` with the
/// binary, which prints it after the run. All categories start at zero.
pub struct FailureStats {
    failures: HashMap<FailureKind, AtomicUsize>,
}

impl Default for FailureStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in FailureKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }
        FailureStats { failures }
    }

    /// Increment the counter for a failure category.
    pub fn increment(&self, kind: FailureKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map. \
                 This indicates a bug in FailureStats initialization.",
                kind
            );
        }
    }

    /// Get the count for a failure category.
    pub fn get_count(&self, kind: FailureKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get total failure count across all categories.
    pub fn total(&self) -> usize {
        FailureKind::iter().map(|k| self.get_count(k)).sum()
    }
}
