//! # Flush Metrics
//!
//! The metrics hook invoked once per flush that performs real work. An
//! external measurement harness reads and resets the counter between timed
//! iterations to count how many bulk operations a resolution strategy
//! actually performed; cache-satisfied loads never touch it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observer notified once per flush that invoked a batch function.
///
/// Injected at loader construction rather than living in process-wide
/// mutable state, so independent harnesses can measure independent scopes.
pub trait FlushObserver: Send + Sync {
    /// Called exactly once per flush with the deduplicated key count
    fn on_flush(&self, relation: &str, unique_keys: usize);
}

/// Counting observer with a read/reset surface for benchmark harnesses
#[derive(Debug, Default)]
pub struct FlushCounter {
    total: AtomicU64,
    keys_fetched: AtomicU64,
    per_relation: Mutex<HashMap<String, u64>>,
}

impl FlushCounter {
    /// Create a counter with all counts at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counts to zero
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.keys_fetched.store(0, Ordering::Relaxed);
        self.per_relation.lock().clear();
    }

    /// Total number of flushes observed since the last reset
    pub fn flushes(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Total number of unique keys dispatched across all flushes
    pub fn keys_fetched(&self) -> u64 {
        self.keys_fetched.load(Ordering::Relaxed)
    }

    /// Number of flushes observed for one relation since the last reset
    pub fn flushes_for(&self, relation: &str) -> u64 {
        self.per_relation.lock().get(relation).copied().unwrap_or(0)
    }
}

impl FlushObserver for FlushCounter {
    fn on_flush(&self, relation: &str, unique_keys: usize) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.keys_fetched
            .fetch_add(unique_keys as u64, Ordering::Relaxed);
        *self
            .per_relation
            .lock()
            .entry(relation.to_string())
            .or_insert(0) += 1;
    }
}

/// Observer for callers that do not measure
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFlushObserver;

impl FlushObserver for NoopFlushObserver {
    fn on_flush(&self, _relation: &str, _unique_keys: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates_per_relation() {
        let counter = FlushCounter::new();
        counter.on_flush("author_by_id", 3);
        counter.on_flush("author_by_id", 1);
        counter.on_flush("reviews_by_book_id", 10);

        assert_eq!(counter.flushes(), 3);
        assert_eq!(counter.keys_fetched(), 14);
        assert_eq!(counter.flushes_for("author_by_id"), 2);
        assert_eq!(counter.flushes_for("reviews_by_book_id"), 1);
        assert_eq!(counter.flushes_for("unknown"), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let counter = FlushCounter::new();
        counter.on_flush("author_by_id", 5);
        counter.reset();

        assert_eq!(counter.flushes(), 0);
        assert_eq!(counter.keys_fetched(), 0);
        assert_eq!(counter.flushes_for("author_by_id"), 0);
    }
}
