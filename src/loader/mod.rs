//! # Batch Loader
//!
//! The coalescing scheduler at the heart of the crate. A [`Loader`] collects
//! the single-key lookups issued during one logical request, deduplicates
//! them, executes exactly one bulk fetch per window through its injected
//! batch function, and redistributes the results to every original caller
//! in arrival order. Outcomes are cached for the lifetime of the scope, so
//! a key is fetched at most once per scope unless its flush failed.
//!
//! ## Flush lifecycle
//!
//! ```text
//! IDLE ──first miss──▶ PENDING ──deferral fires──▶ FLUSHING ─┬─▶ IDLE
//!                                                            └─▶ PENDING
//!                                       (misses arrived during the flush)
//! ```
//!
//! The coalescing window is the deferral between scheduling and flushing:
//! a single `yield_now` by default, so every key requested in the same
//! synchronous burst of `load` calls lands in the same flush. Keys arriving
//! while a flush is executing never mutate it; they accumulate in a fresh
//! queue and form the next window.
//!
//! At most one flush task exists per loader. The task holds only a weak
//! reference to the loader state: dropping the scope rejects all
//! outstanding requests with a cancellation error instead of leaving them
//! unresolved.

mod cache;
mod queue;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::batch_fn::BatchFn;
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};
use crate::logging;
use crate::metrics::FlushObserver;

use cache::{ScopeCache, Slot};
use queue::{BatchQueue, DetachedBatch};

/// Delivery payload: `None` until the flush settles the key
pub(crate) type Outcome<V> = Option<LoadResult<V>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushPhase {
    Idle,
    Scheduled,
    Flushing,
}

/// What a `load` call found at enqueue time
enum Pending<V> {
    Ready(LoadResult<V>),
    Wait(watch::Receiver<Outcome<V>>),
}

struct LoaderState<K, V> {
    queue: BatchQueue<K, V>,
    cache: ScopeCache<K, V>,
    phase: FlushPhase,
}

struct LoaderInner<K, V> {
    relation: Arc<str>,
    batch_fn: Arc<dyn BatchFn<K, V>>,
    observer: Arc<dyn FlushObserver>,
    config: LoaderConfig,
    state: Mutex<LoaderState<K, V>>,
}

/// Coalescing batch scheduler for one relation within one scope.
///
/// Cheap to clone; all clones share the same queue and cache. The loader
/// is scoped to one logical request and is never shared across scopes.
pub struct Loader<K, V> {
    inner: Arc<LoaderInner<K, V>>,
}

impl<K, V> Clone for Loader<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Loader<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a loader for `relation` backed by the given batch function
    pub fn new(
        relation: impl Into<String>,
        batch_fn: Arc<dyn BatchFn<K, V>>,
        observer: Arc<dyn FlushObserver>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                relation: Arc::from(relation.into()),
                batch_fn,
                observer,
                config,
                state: Mutex::new(LoaderState {
                    queue: BatchQueue::new(),
                    cache: ScopeCache::new(),
                    phase: FlushPhase::Idle,
                }),
            }),
        }
    }

    /// Name of the relation this loader resolves
    pub fn relation(&self) -> &str {
        &self.inner.relation
    }

    /// Request the value for `key`.
    ///
    /// The key is enqueued (or matched against the cache) synchronously,
    /// before the returned future is first polled, so every `load` issued in
    /// one synchronous burst joins the same coalescing window. Must be
    /// called within a Tokio runtime.
    ///
    /// The returned future owns its delivery slot and nothing else: it stays
    /// valid after every `Loader` handle is dropped, in which case it
    /// resolves to [`LoadError::Cancelled`].
    pub fn load(&self, key: K) -> impl Future<Output = LoadResult<V>> + Send + 'static {
        let relation = Arc::clone(&self.inner.relation);
        let pending = {
            let mut state = self.inner.state.lock();
            match state.cache.get(&key) {
                Some(Slot::Resolved(outcome)) => Pending::Ready(outcome),
                Some(Slot::InFlight(rx)) => Pending::Wait(rx),
                None => {
                    debug_assert!(!state.queue.contains(&key));
                    let (tx, rx) = watch::channel(None);
                    let seq = state.queue.push(key.clone(), tx);
                    state.cache.put_in_flight(key.clone(), rx.clone());
                    debug!(
                        relation = %relation,
                        key = ?key,
                        seq,
                        queue_len = state.queue.len(),
                        "enqueued key for next flush"
                    );
                    if state.phase == FlushPhase::Idle {
                        state.phase = FlushPhase::Scheduled;
                        spawn_flush_task(
                            Arc::downgrade(&self.inner),
                            Arc::clone(&relation),
                            self.inner.config.clone(),
                        );
                    }
                    Pending::Wait(rx)
                }
            }
        };

        async move {
            match pending {
                Pending::Ready(outcome) => outcome,
                Pending::Wait(mut rx) => match rx.wait_for(|outcome| outcome.is_some()).await {
                    Ok(settled) => match (*settled).clone() {
                        Some(outcome) => outcome,
                        None => Err(LoadError::cancelled(relation.as_ref())),
                    },
                    Err(_) => Err(LoadError::cancelled(relation.as_ref())),
                },
            }
        }
    }
}

/// Spawn the deferred flush task for a loader that just left `Idle`.
///
/// The task loops as long as new windows keep forming, so at most one flush
/// is ever in flight per loader.
fn spawn_flush_task<K, V>(state: Weak<LoaderInner<K, V>>, relation: Arc<str>, config: LoaderConfig)
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            // The coalescing window: let the current synchronous burst of
            // load calls finish before the queue is detached.
            match config.flush_delay() {
                Some(delay) => tokio::time::sleep(delay).await,
                None => tokio::task::yield_now().await,
            }

            let Some(inner) = state.upgrade() else {
                return;
            };

            let batch = {
                let mut st = inner.state.lock();
                let batch = st.queue.take();
                if batch.is_empty() {
                    st.phase = FlushPhase::Idle;
                    return;
                }
                st.phase = FlushPhase::Flushing;
                batch
            };

            let keys = batch.unique_keys();
            let batch_fn = Arc::clone(&inner.batch_fn);
            let observer = Arc::clone(&inner.observer);
            // Release the strong handle while the batch function runs so a
            // scope discarded mid-flight is observable afterwards.
            drop(inner);

            debug!(
                relation = %relation,
                unique_keys = keys.len(),
                pending_requests = batch.len(),
                "flushing window"
            );

            let started = Instant::now();
            let result = match config.flush_timeout() {
                Some(bound) => match tokio::time::timeout(bound, batch_fn.load(&keys)).await {
                    Ok(outcome) => outcome
                        .map_err(|e| LoadError::batch_failed(relation.as_ref(), e.to_string())),
                    Err(_) => Err(LoadError::timeout(
                        relation.as_ref(),
                        bound.as_millis() as u64,
                    )),
                },
                None => batch_fn
                    .load(&keys)
                    .await
                    .map_err(|e| LoadError::batch_failed(relation.as_ref(), e.to_string())),
            };

            observer.on_flush(&relation, keys.len());
            logging::log_flush_operation(
                &relation,
                keys.len(),
                batch.len(),
                if result.is_ok() { "success" } else { "failure" },
                started.elapsed().as_millis() as u64,
            );

            let Some(inner) = state.upgrade() else {
                reject_all(&batch, LoadError::cancelled(relation.as_ref()));
                return;
            };

            let mut st = inner.state.lock();
            match result {
                Ok(values) if values.len() != keys.len() => {
                    error!(
                        relation = %relation,
                        expected = keys.len(),
                        actual = values.len(),
                        "batch function broke result alignment; rejecting whole flush"
                    );
                    let err =
                        LoadError::contract_violation(relation.as_ref(), keys.len(), values.len());
                    for entry in batch.entries() {
                        st.cache.evict(&entry.key);
                    }
                    reject_all(&batch, err);
                }
                Ok(values) => {
                    debug_assert!(batch.entries().windows(2).all(|w| w[0].seq < w[1].seq));
                    let by_key: HashMap<K, V> = keys.into_iter().zip(values).collect();
                    for entry in batch.entries() {
                        match by_key.get(&entry.key) {
                            Some(value) => {
                                if st
                                    .cache
                                    .resolve(entry.key.clone(), Ok(value.clone()))
                                    .is_err()
                                {
                                    error!(
                                        relation = %relation,
                                        key = ?entry.key,
                                        "duplicate resolve for key; keeping original outcome"
                                    );
                                }
                                let _ = entry.slot.send(Some(Ok(value.clone())));
                            }
                            None => {
                                st.cache.evict(&entry.key);
                                let err = LoadError::batch_failed(
                                    relation.as_ref(),
                                    format!("no result for key {:?}", entry.key),
                                );
                                let _ = entry.slot.send(Some(Err(err)));
                            }
                        }
                    }
                }
                Err(err) => {
                    for entry in batch.entries() {
                        st.cache.evict(&entry.key);
                    }
                    reject_all(&batch, err);
                }
            }

            debug!(
                relation = %relation,
                cached = st.cache.len(),
                "flush distributed"
            );

            if st.queue.is_empty() {
                st.phase = FlushPhase::Idle;
                return;
            }
            // Misses that arrived during the flush already form the next
            // window; loop around for it.
            st.phase = FlushPhase::Scheduled;
        }
    });
}

fn reject_all<K, V>(batch: &DetachedBatch<K, V>, err: LoadError)
where
    K: Clone + Eq + Hash,
{
    for entry in batch.entries() {
        let _ = entry.slot.send(Some(Err(err.clone())));
    }
}
