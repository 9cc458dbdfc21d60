//! Cooperative cancellation token
//!
//! Every tool call and every in-flight transport request accepts one of
//! these (§5, Cancellation). It is the workspace's existing cancel-flag
//! pattern (compare `symbols_core`'s predecessor `TaskContext`), extended
//! with a `Notify` so waiters don't have to busy-poll the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

/// A cheaply-cloneable cancellation signal.
#[derive(Clone)]
pub struct CancelToken(Arc<Inner>);

impl CancelToken {
    /// Create a new, not-yet-cancelled token.
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            flag: AtomicBool::new(false),
            notify: Notify::new(),
        }))
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.flag.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    /// Check whether cancellation was requested, without waiting.
    pub fn is_cancelled(&self) -> bool {
        self.0.flag.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested. Cancellation that
    /// already happened before this call still resolves immediately.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.0.notify.notified();
            // Re-check after subscribing to avoid missing a cancel() that
            // raced between the first check and notified().
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_before_wait_still_resolves() {
        let token = CancelToken::new();
        token.cancel();
        token.cancelled().await; // must not hang
    }

    #[tokio::test]
    async fn cancel_after_subscribe_wakes_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        token.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
