//! Cancellation scope owned by a view.
//!
//! Every async step a view starts goes through [`ViewScope::run`]. Cancelling the
//! scope (explicitly, through a [`ScopeHandle`], or by dropping the view) aborts
//! those steps, and `run` reports `None` so the view leaves its state alone.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};

#[derive(Default)]
struct ScopeInner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
}

impl ScopeInner {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let handles: Vec<AbortHandle> = self
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        if !handles.is_empty() {
            tracing::debug!("Aborting {} in-flight view operations", handles.len());
        }
        for handle in handles {
            handle.abort();
        }
    }
}

pub struct ViewScope {
    inner: Arc<ScopeInner>,
}

/// Cancels a [`ViewScope`] from outside the view
#[derive(Clone)]
pub struct ScopeHandle {
    inner: Arc<ScopeInner>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner::default()),
        }
    }

    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Drive `future` to completion unless the scope is cancelled first
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }

        let (handle, registration) = AbortHandle::new_pair();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id, handle);

        let result = Abortable::new(future, registration).await;

        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&id);

        // A result that lands after cancellation is discarded too
        match result {
            Ok(output) if !self.is_cancelled() => Some(output),
            _ => None,
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

impl ScopeHandle {
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_run_passes_output_through() {
        let scope = ViewScope::new();
        assert_eq!(scope.run(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_future() {
        let scope = Arc::new(ViewScope::new());
        let release = Arc::new(Notify::new());

        let task = {
            let scope = Arc::clone(&scope);
            let release = Arc::clone(&release);
            tokio::spawn(async move {
                scope
                    .run(async move {
                        release.notified().await;
                        "late"
                    })
                    .await
            })
        };

        tokio::task::yield_now().await;
        scope.handle().cancel();
        release.notify_one();

        assert_eq!(task.await.unwrap(), None);
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_scope_never_starts_work() {
        let scope = ViewScope::new();
        scope.cancel();

        let mut started = false;
        let output = scope
            .run(async {
                started = true;
            })
            .await;

        assert_eq!(output, None);
        assert!(!started);
    }

    #[test]
    fn test_drop_cancels_handles() {
        let scope = ViewScope::new();
        let handle = scope.handle();
        assert!(!handle.is_cancelled());

        drop(scope);
        assert!(handle.is_cancelled());
    }
}
