//! # Batch Function Traits
//!
//! The bulk-fetch contract between a loader and its external collaborator.
//! Given an ordered sequence of unique keys, a batch function performs
//! exactly one bulk operation and returns outcomes aligned by position:
//! same length, same order. The collaborator owns the fetch mechanics (for
//! example one query with an IN-style predicate) and must preserve the
//! key→outcome alignment regardless of the underlying fetch's native order.

use async_trait::async_trait;

use crate::error::BatchError;

/// Position-aligned bulk fetch invoked once per flush.
///
/// `keys` is deduplicated and in first-occurrence order. The result must
/// contain exactly one entry per key; any length mismatch is treated by the
/// loader as a contract violation, never realigned best-effort.
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync {
    async fn load(&self, keys: &[K]) -> Result<Vec<V>, BatchError>;
}

/// Single-valued flavor: each key maps to zero or one value.
///
/// Absence is an explicit `None`, not an error, and does not affect sibling
/// requests in the same flush.
#[async_trait]
pub trait BatchFetchOne<K, V>: Send + Sync {
    async fn fetch_one(&self, keys: &[K]) -> Result<Vec<Option<V>>, BatchError>;
}

/// Multi-valued flavor: each key maps to a possibly empty ordered collection.
#[async_trait]
pub trait BatchFetchMany<K, V>: Send + Sync {
    async fn fetch_many(&self, keys: &[K]) -> Result<Vec<Vec<V>>, BatchError>;
}

#[async_trait]
impl<T, K, V> BatchFn<K, Option<V>> for T
where
    T: BatchFetchOne<K, V>,
    K: Send + Sync,
    V: Send,
{
    async fn load(&self, keys: &[K]) -> Result<Vec<Option<V>>, BatchError> {
        self.fetch_one(keys).await
    }
}

#[async_trait]
impl<T, K, V> BatchFn<K, Vec<V>> for T
where
    T: BatchFetchMany<K, V>,
    K: Send + Sync,
    V: Send,
{
    async fn load(&self, keys: &[K]) -> Result<Vec<Vec<V>>, BatchError> {
        self.fetch_many(keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EvenLookup;

    #[async_trait]
    impl BatchFetchOne<i64, i64> for EvenLookup {
        async fn fetch_one(&self, keys: &[i64]) -> Result<Vec<Option<i64>>, BatchError> {
            Ok(keys
                .iter()
                .map(|k| (k % 2 == 0).then_some(*k * 10))
                .collect())
        }
    }

    struct DivisorLookup;

    #[async_trait]
    impl BatchFetchMany<i64, i64> for DivisorLookup {
        async fn fetch_many(&self, keys: &[i64]) -> Result<Vec<Vec<i64>>, BatchError> {
            Ok(keys
                .iter()
                .map(|k| (1..=*k).filter(|d| k % d == 0).collect())
                .collect())
        }
    }

    #[test]
    fn test_single_valued_adapter_preserves_alignment() {
        let fetched = tokio_test::block_on(BatchFn::load(&EvenLookup, &[1, 2, 3, 4])).unwrap();
        assert_eq!(fetched, vec![None, Some(20), None, Some(40)]);
    }

    #[test]
    fn test_multi_valued_adapter_yields_empty_for_barren_keys() {
        let fetched = tokio_test::block_on(BatchFn::load(&DivisorLookup, &[6, 0])).unwrap();
        assert_eq!(fetched, vec![vec![1, 2, 3, 6], vec![]]);
    }
}
