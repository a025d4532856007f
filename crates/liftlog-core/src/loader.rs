//! Request-scoped batch loader
//!
//! Collects keys requested by sibling resolvers, issues one batched fetch per
//! dispatch, and hands each caller its own slice of the result. Every key is
//! fetched at most once per loader instance: later calls reuse the in-flight
//! or settled result, failures included.
//!
//! A loader is built per request and never shared between requests, so its
//! cache needs no eviction.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{try_join_all, BoxFuture, Shared};
use futures::FutureExt;
use liftlog_core_types::Cancellation;
use tokio::sync::oneshot;

use crate::errors::{LiftError, Result};

/// One batched fetch of children keyed by parent
#[async_trait]
pub trait BatchFn: Send + Sync + 'static {
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    /// Fetch children for every key in one storage call
    ///
    /// Keys are unique and in request order. Keys absent from the returned
    /// map resolve to an empty list.
    async fn load(&self, keys: &[Self::Key]) -> Result<HashMap<Self::Key, Vec<Self::Value>>>;
}

/// When a pending batch is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Batch window started by the first pending key; `None` means only
    /// `dispatch` and the size cap trigger a fetch
    pub wait: Option<Duration>,
    /// A batch dispatches as soon as it holds this many keys
    pub max_batch_size: usize,
}

impl LoaderConfig {
    /// No timer: batches go out on `dispatch()` or when full
    pub fn manual() -> Self {
        Self {
            wait: None,
            ..Self::default()
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            wait: Some(Duration::from_millis(2)),
            max_batch_size: 100,
        }
    }
}

type Loaded<V> = Result<Arc<Vec<V>>>;
type Slot<V> = Shared<BoxFuture<'static, Loaded<V>>>;
type Reply<V> = oneshot::Sender<Loaded<V>>;

struct State<K, V> {
    cache: HashMap<K, Slot<V>>,
    pending: Vec<(K, Reply<V>)>,
    timer_armed: bool,
}

struct Inner<F: BatchFn> {
    batch_fn: F,
    cancellation: Cancellation,
    config: LoaderConfig,
    state: Mutex<State<F::Key, F::Value>>,
}

impl<F: BatchFn> Inner<F> {
    fn lock_state(&self) -> MutexGuard<'_, State<F::Key, F::Value>> {
        // The state is a plain map plus a queue; a panic while holding the
        // lock cannot leave it half-updated in a way later callers care about.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_pending(&self) -> Vec<(F::Key, Reply<F::Value>)> {
        let mut state = self.lock_state();
        state.timer_armed = false;
        std::mem::take(&mut state.pending)
    }

    async fn run_batch(&self, batch: Vec<(F::Key, Reply<F::Value>)>) {
        if batch.is_empty() {
            return;
        }

        if self.cancellation.is_cancelled() {
            tracing::debug!(key_count = batch.len(), "batch dropped: request cancelled");
            for (_, reply) in batch {
                let _ = reply.send(Err(LiftError::Cancelled));
            }
            return;
        }

        let keys: Vec<F::Key> = batch.iter().map(|(key, _)| key.clone()).collect();
        tracing::debug!(key_count = keys.len(), "dispatching batch");

        // Receivers that went away (cancelled consumers) are ignored on send.
        match self.batch_fn.load(&keys).await {
            Ok(mut found) => {
                for (key, reply) in batch {
                    let children = found.remove(&key).unwrap_or_default();
                    let _ = reply.send(Ok(Arc::new(children)));
                }
            }
            Err(err) => {
                tracing::debug!(key_count = keys.len(), error = %err, "batch failed");
                for (_, reply) in batch {
                    let _ = reply.send(Err(err.clone()));
                }
            }
        }
    }
}

/// Single-flight, batching loader bound to one request
///
/// Clones share the same cache and queue.
pub struct BatchLoader<F: BatchFn> {
    inner: Arc<Inner<F>>,
}

impl<F: BatchFn> Clone for BatchLoader<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: BatchFn> fmt::Debug for BatchLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchLoader")
            .field("config", &self.inner.config)
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl<F: BatchFn> BatchLoader<F> {
    pub fn new(batch_fn: F, cancellation: Cancellation, config: LoaderConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                batch_fn,
                cancellation,
                config,
                state: Mutex::new(State {
                    cache: HashMap::new(),
                    pending: Vec::new(),
                    timer_armed: false,
                }),
            }),
        }
    }

    /// Request the children of `key`
    ///
    /// The key is queued when this is called, not when the future is first
    /// polled. Once the request is cancelled the future resolves to
    /// `Cancelled`, even if a fetch already returned data for the key.
    pub fn load(&self, key: F::Key) -> impl Future<Output = Loaded<F::Value>> + Send + 'static {
        let slot = self.enqueue(key);
        let cancellation = self.inner.cancellation.clone();
        async move {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(LiftError::Cancelled),
                loaded = slot => loaded,
            }
        }
    }

    /// Request several keys at once; results come back in the same order
    pub fn load_many<I>(
        &self,
        keys: I,
    ) -> impl Future<Output = Result<Vec<Arc<Vec<F::Value>>>>> + Send + 'static
    where
        I: IntoIterator<Item = F::Key>,
    {
        let loads: Vec<_> = keys.into_iter().map(|key| self.load(key)).collect();
        try_join_all(loads)
    }

    /// Request the children of `key` from a resolver that has nobody else to
    /// dispatch for it
    ///
    /// With a batch window this is `load`. Without one, the caller yields once
    /// so sibling loads polled alongside it can queue their keys, then
    /// dispatches whatever is pending.
    pub async fn load_and_dispatch(&self, key: F::Key) -> Loaded<F::Value> {
        let slot = self.load(key);
        if self.inner.config.wait.is_none() {
            tokio::task::yield_now().await;
            self.dispatch().await;
        }
        slot.await
    }

    /// Send everything queued so far as one batch and wait for it to settle
    pub async fn dispatch(&self) {
        let batch = self.inner.take_pending();
        self.inner.run_batch(batch).await;
    }

    /// Keys queued but not yet dispatched
    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    fn enqueue(&self, key: F::Key) -> Slot<F::Value> {
        let mut state = self.inner.lock_state();
        if let Some(slot) = state.cache.get(&key) {
            return slot.clone();
        }

        let (reply, rx) = oneshot::channel::<Loaded<F::Value>>();
        // A reply dropped without a send means the batch never ran.
        let slot = rx
            .map(|received| received.unwrap_or(Err(LiftError::Cancelled)))
            .boxed()
            .shared();
        state.cache.insert(key.clone(), slot.clone());
        state.pending.push((key, reply));

        let runtime = tokio::runtime::Handle::try_current().ok();

        if state.pending.len() >= self.inner.config.max_batch_size {
            if let Some(runtime) = runtime {
                state.timer_armed = false;
                let batch = std::mem::take(&mut state.pending);
                drop(state);
                let inner = Arc::clone(&self.inner);
                runtime.spawn(async move { inner.run_batch(batch).await });
            }
        } else if let (Some(wait), false, Some(runtime)) =
            (self.inner.config.wait, state.timer_armed, runtime)
        {
            state.timer_armed = true;
            drop(state);
            let inner = Arc::clone(&self.inner);
            runtime.spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = inner.cancellation.cancelled() => {}
                }
                let batch = inner.take_pending();
                inner.run_batch(batch).await;
            });
        }

        slot
    }
}
