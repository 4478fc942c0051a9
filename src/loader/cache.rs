//! Per-scope result cache.
//!
//! Created empty with its loader and never shared across scopes. Entries
//! are written once: a key goes in-flight when its first load is enqueued,
//! resolves at most once, and is only removed when a flush fails so a later
//! load can start a fresh attempt.

use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::watch;

use crate::error::LoadResult;

use super::Outcome;

/// State of one cached key
#[derive(Debug, Clone)]
pub(crate) enum Slot<V> {
    /// Enqueued or dispatched; the receiver yields the outcome when it lands
    InFlight(watch::Receiver<Outcome<V>>),
    /// Outcome settled for the remainder of the scope's lifetime
    Resolved(LoadResult<V>),
}

/// A second resolve for an already-resolved key; the original outcome wins
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ResolveConflict;

#[derive(Debug)]
pub(crate) struct ScopeCache<K, V> {
    slots: HashMap<K, Slot<V>>,
}

impl<K, V> ScopeCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<Slot<V>> {
        self.slots.get(key).cloned()
    }

    /// Record the placeholder for a freshly enqueued key
    pub fn put_in_flight(&mut self, key: K, rx: watch::Receiver<Outcome<V>>) {
        self.slots.insert(key, Slot::InFlight(rx));
    }

    /// Settle a key. Write-once: an already-resolved key is left untouched.
    pub fn resolve(&mut self, key: K, outcome: LoadResult<V>) -> Result<(), ResolveConflict> {
        match self.slots.get(&key) {
            Some(Slot::Resolved(_)) => Err(ResolveConflict),
            _ => {
                self.slots.insert(key, Slot::Resolved(outcome));
                Ok(())
            }
        }
    }

    /// Drop a key after a failed flush so the next load retries
    pub fn evict(&mut self, key: &K) {
        self.slots.remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_then_resolved() {
        let mut cache: ScopeCache<i64, String> = ScopeCache::new();
        let (_tx, rx) = watch::channel(None);

        cache.put_in_flight(7, rx);
        assert!(matches!(cache.get(&7), Some(Slot::InFlight(_))));

        cache.resolve(7, Ok("seven".to_string())).unwrap();
        match cache.get(&7) {
            Some(Slot::Resolved(Ok(v))) => assert_eq!(v, "seven"),
            other => panic!("unexpected slot: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_is_write_once() {
        let mut cache: ScopeCache<i64, String> = ScopeCache::new();
        cache.resolve(1, Ok("first".to_string())).unwrap();
        assert_eq!(
            cache.resolve(1, Ok("second".to_string())),
            Err(ResolveConflict)
        );
        match cache.get(&1) {
            Some(Slot::Resolved(Ok(v))) => assert_eq!(v, "first"),
            other => panic!("unexpected slot: {other:?}"),
        }
    }

    #[test]
    fn test_evict_allows_fresh_attempt() {
        let mut cache: ScopeCache<i64, String> = ScopeCache::new();
        let (_tx, rx) = watch::channel(None);
        cache.put_in_flight(1, rx);
        cache.evict(&1);
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.len(), 0);

        // A post-eviction resolve is a fresh write, not a conflict.
        cache.resolve(1, Ok("retry".to_string())).unwrap();
    }
}
