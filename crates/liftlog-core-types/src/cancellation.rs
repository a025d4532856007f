//! Request-scoped cancellation
//!
//! A `Cancellation` is created with each inbound request and handed to
//! everything that does deferred work on its behalf (batch loaders in
//! particular). Clones observe the same signal.

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation signal shared by every clone
#[derive(Debug, Clone)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    /// Create a signal in the "not cancelled" state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Flag the request as cancelled. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Non-blocking check
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // The sender lives in `self`, so `changed` cannot observe a closed channel here.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_uncancelled() {
        let c = Cancellation::new();
        assert!(!c.is_cancelled());
    }

    #[test]
    fn test_cancel_visible_to_clones() {
        let c = Cancellation::new();
        let clone = c.clone();
        clone.cancel();
        assert!(c.is_cancelled());
        // Second cancel is a no-op
        c.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let c = Cancellation::new();
        let waiter = c.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(Duration::from_millis(5)).await;
        c.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let c = Cancellation::new();
        c.cancel();
        tokio::time::timeout(Duration::from_millis(100), c.cancelled())
            .await
            .expect("already-cancelled signal should resolve at once");
    }
}
