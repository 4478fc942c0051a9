//! Pending-request queue for one coalescing window.
//!
//! Requests accumulate here between flushes in arrival order. The seen-set
//! gives O(1) detection of a key already enqueued in the current window, so
//! the deduplicated dispatch list never needs a rescan.

use std::collections::HashSet;
use std::hash::Hash;

use tokio::sync::watch;

use super::Outcome;

/// One enqueued key request awaiting the next flush
#[derive(Debug)]
pub(crate) struct PendingRequest<K, V> {
    pub key: K,
    pub seq: u64,
    pub slot: watch::Sender<Outcome<V>>,
}

/// Ordered, deduplicating holding area for requests in the current window
#[derive(Debug)]
pub(crate) struct BatchQueue<K, V> {
    entries: Vec<PendingRequest<K, V>>,
    seen: HashSet<K>,
    next_seq: u64,
}

impl<K, V> BatchQueue<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            seen: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Append a request and return its insertion sequence number
    pub fn push(&mut self, key: K, slot: watch::Sender<Outcome<V>>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.seen.insert(key.clone());
        self.entries.push(PendingRequest { key, seq, slot });
        seq
    }

    /// Whether `key` is already enqueued in this window
    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Detach the current window, leaving a fresh empty queue behind.
    ///
    /// The sequence counter survives so ordering stays monotonic across
    /// windows within one scope.
    pub fn take(&mut self) -> DetachedBatch<K, V> {
        self.seen.clear();
        DetachedBatch {
            entries: std::mem::take(&mut self.entries),
        }
    }
}

/// A window detached for flushing; subsequent loads no longer touch it
#[derive(Debug)]
pub(crate) struct DetachedBatch<K, V> {
    entries: Vec<PendingRequest<K, V>>,
}

impl<K, V> DetachedBatch<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[PendingRequest<K, V>] {
        &self.entries
    }

    /// Deduplicated key list in first-occurrence order
    pub fn unique_keys(&self) -> Vec<K> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        let mut keys = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if seen.insert(entry.key.clone()) {
                keys.push(entry.key.clone());
            }
        }
        keys
    }
}
