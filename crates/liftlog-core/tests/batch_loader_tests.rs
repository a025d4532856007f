#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use liftlog_core::errors::{LiftError, Result};
use liftlog_core::{BatchFn, BatchLoader, LoaderConfig};
use liftlog_core_types::Cancellation;
use tokio::sync::Notify;

/// Fake children store that records every batched call
#[derive(Clone, Default)]
struct RecordingFetch {
    children: Arc<HashMap<i64, Vec<String>>>,
    calls: Arc<Mutex<Vec<Vec<i64>>>>,
    fail: Arc<AtomicBool>,
    gate: Option<Arc<Notify>>,
}

impl RecordingFetch {
    /// One `(parent, child)` pair per child row
    fn with_children(rows: &[(i64, &str)]) -> Self {
        let mut children: HashMap<i64, Vec<String>> = HashMap::new();
        for (parent, child) in rows {
            children.entry(*parent).or_default().push(child.to_string());
        }
        Self {
            children: Arc::new(children),
            ..Default::default()
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn calls(&self) -> Vec<Vec<i64>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchFn for RecordingFetch {
    type Key = i64;
    type Value = String;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
        self.calls.lock().unwrap().push(keys.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(LiftError::backend("connection reset"));
        }
        Ok(keys
            .iter()
            .filter_map(|k| self.children.get(k).map(|v| (*k, v.clone())))
            .collect())
    }
}

fn manual_loader(fetch: RecordingFetch) -> (BatchLoader<RecordingFetch>, Cancellation) {
    let cancellation = Cancellation::new();
    let loader = BatchLoader::new(fetch, cancellation.clone(), LoaderConfig::manual());
    (loader, cancellation)
}

#[tokio::test]
async fn test_same_key_is_fetched_once() {
    let fetch = RecordingFetch::with_children(&[(7, "squat"), (7, "bench")]);
    let (loader, _cancel) = manual_loader(fetch.clone());

    let first = loader.load(7);
    let second = loader.load(7);
    assert_eq!(loader.pending_len(), 1);

    loader.dispatch().await;
    let (a, b) = tokio::join!(first, second);
    let a = a.unwrap();
    let b = b.unwrap();

    assert_eq!(fetch.calls(), vec![vec![7]]);
    assert_eq!(*a, vec!["squat", "bench"]);
    assert!(Arc::ptr_eq(&a, &b));

    // Settled keys are served from the cache without another call
    let again = loader.load(7).await.unwrap();
    assert!(Arc::ptr_eq(&a, &again));
    assert_eq!(fetch.calls().len(), 1);
}

#[tokio::test]
async fn test_distinct_keys_share_one_call_in_request_order() {
    let fetch = RecordingFetch::with_children(&[(1, "a"), (2, "b"), (2, "c"), (3, "d")]);
    let (loader, _cancel) = manual_loader(fetch.clone());

    let k1 = loader.load(1);
    let k2 = loader.load(2);
    let k3 = loader.load(3);
    loader.dispatch().await;

    assert_eq!(fetch.calls(), vec![vec![1, 2, 3]]);
    assert_eq!(*k1.await.unwrap(), vec!["a"]);
    assert_eq!(*k2.await.unwrap(), vec!["b", "c"]);
    assert_eq!(*k3.await.unwrap(), vec!["d"]);
}

#[tokio::test]
async fn test_missing_key_resolves_empty() {
    let fetch = RecordingFetch::with_children(&[(1, "a")]);
    let (loader, _cancel) = manual_loader(fetch);

    let missing = loader.load(99);
    loader.dispatch().await;

    assert!(missing.await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_batch_fails_every_key_identically() {
    let fetch = RecordingFetch::with_children(&[(1, "a"), (2, "b")]);
    fetch.fail.store(true, Ordering::SeqCst);
    let (loader, _cancel) = manual_loader(fetch.clone());

    let k1 = loader.load(1);
    let k2 = loader.load(2);
    loader.dispatch().await;

    let e1 = k1.await.unwrap_err();
    let e2 = k2.await.unwrap_err();
    assert_eq!(e1, e2);
    assert!(matches!(e1, LiftError::Backend { .. }));

    // The failure is cached for the loader's lifetime
    fetch.fail.store(false, Ordering::SeqCst);
    assert_eq!(loader.load(1).await.unwrap_err(), e1);
    assert_eq!(fetch.calls().len(), 1);
}

#[tokio::test]
async fn test_cancel_before_dispatch_skips_storage() {
    let fetch = RecordingFetch::with_children(&[(1, "a")]);
    let (loader, cancel) = manual_loader(fetch.clone());

    let pending = loader.load(1);
    cancel.cancel();
    loader.dispatch().await;

    assert_eq!(pending.await.unwrap_err(), LiftError::Cancelled);
    assert!(fetch.calls().is_empty());
}

#[tokio::test]
async fn test_cancel_after_dispatch_suppresses_delivery() {
    let gate = Arc::new(Notify::new());
    let fetch = RecordingFetch::with_children(&[(1, "a")]).gated(gate.clone());
    let (loader, cancel) = manual_loader(fetch.clone());

    let pending = loader.load(1);
    let dispatcher = loader.clone();
    let in_flight = tokio::spawn(async move { dispatcher.dispatch().await });

    // Wait until the batched call has started
    while fetch.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    cancel.cancel();
    gate.notify_one();

    // The storage call runs to completion
    in_flight.await.unwrap();
    assert_eq!(fetch.calls(), vec![vec![1]]);
    assert_eq!(pending.await.unwrap_err(), LiftError::Cancelled);
}

#[tokio::test]
async fn test_timer_dispatches_automatically() {
    let fetch = RecordingFetch::with_children(&[(1, "a"), (2, "b")]);
    let config = LoaderConfig::manual().with_wait(Duration::from_millis(5));
    let loader = BatchLoader::new(fetch.clone(), Cancellation::new(), config);

    let (a, b) = tokio::join!(loader.load(1), loader.load(2));

    assert_eq!(*a.unwrap(), vec!["a"]);
    assert_eq!(*b.unwrap(), vec!["b"]);
    assert_eq!(fetch.calls(), vec![vec![1, 2]]);
}

#[tokio::test]
async fn test_full_batch_dispatches_without_waiting() {
    let fetch = RecordingFetch::with_children(&[(1, "a"), (2, "b"), (3, "c")]);
    let config = LoaderConfig::manual().with_max_batch_size(2);
    let loader = BatchLoader::new(fetch.clone(), Cancellation::new(), config);

    let k1 = loader.load(1);
    let k2 = loader.load(2);
    let k3 = loader.load(3);
    assert_eq!(loader.pending_len(), 1);

    let (r1, r2) = tokio::time::timeout(Duration::from_secs(1), async { tokio::join!(k1, k2) })
        .await
        .expect("full batch should dispatch on its own");
    assert_eq!(*r1.unwrap(), vec!["a"]);
    assert_eq!(*r2.unwrap(), vec!["b"]);

    loader.dispatch().await;
    assert_eq!(*k3.await.unwrap(), vec!["c"]);
    assert_eq!(fetch.calls(), vec![vec![1, 2], vec![3]]);
}

#[tokio::test]
async fn test_load_many_preserves_order_and_dedups() {
    let fetch = RecordingFetch::with_children(&[(1, "a"), (2, "b")]);
    let config = LoaderConfig::manual().with_wait(Duration::from_millis(1));
    let loader = BatchLoader::new(fetch.clone(), Cancellation::new(), config);

    let results = loader.load_many(vec![2, 1, 2]).await.unwrap();
    let flat: Vec<Vec<String>> = results.iter().map(|r| r.as_ref().clone()).collect();

    assert_eq!(flat, vec![vec!["b"], vec!["a"], vec!["b"]]);
    assert_eq!(fetch.calls(), vec![vec![2, 1]]);
}

#[tokio::test]
async fn test_loaders_do_not_share_cache() {
    let fetch = RecordingFetch::with_children(&[(1, "a")]);
    let (first, _c1) = manual_loader(fetch.clone());
    let (second, _c2) = manual_loader(fetch.clone());

    let a = first.load(1);
    first.dispatch().await;
    a.await.unwrap();

    let b = second.load(1);
    second.dispatch().await;
    b.await.unwrap();

    assert_eq!(fetch.calls().len(), 2);
}

#[tokio::test]
async fn test_load_and_dispatch_batches_siblings_without_timer() {
    let fetch = RecordingFetch::with_children(&[(1, "deadlift"), (2, "row")]);
    let (loader, _cancel) = manual_loader(fetch.clone());

    let (first, second) = tokio::time::timeout(Duration::from_secs(2), async {
        tokio::join!(loader.load_and_dispatch(1), loader.load_and_dispatch(2))
    })
    .await
    .expect("self-dispatching loads must settle without a timer");

    assert_eq!(*first.unwrap(), vec!["deadlift".to_string()]);
    assert_eq!(*second.unwrap(), vec!["row".to_string()]);
    assert_eq!(fetch.calls(), vec![vec![1, 2]]);
}

#[tokio::test]
async fn test_load_and_dispatch_reuses_settled_key() {
    let fetch = RecordingFetch::with_children(&[(4, "press")]);
    let (loader, _cancel) = manual_loader(fetch.clone());

    loader.load_and_dispatch(4).await.unwrap();
    let again = loader.load_and_dispatch(4).await.unwrap();

    assert_eq!(*again, vec!["press".to_string()]);
    assert_eq!(fetch.calls().len(), 1);
}
