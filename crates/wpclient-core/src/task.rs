//! Cancellable background tasks.
//!
//! Every long-running client operation runs on the tokio runtime and is tracked by the
//! client's `TaskTracker`, so shutdown can wait for all of them. Cancellation is
//! cooperative: the task observes its `CancellationToken` at its own checkpoints and is
//! never aborted mid-step.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::errors::{ClientError, ClientResult};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to one background invocation.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    token: CancellationToken,
    join: JoinHandle<T>,
}

impl<T: Send + 'static> TaskHandle<T> {
    /// Spawn `make(id, token)` on `tracker`. The task token is a child of `parent`, so
    /// cancelling the parent cancels the task too. Ids are unique per process.
    pub fn spawn<F, Fut>(tracker: &TaskTracker, parent: &CancellationToken, make: F) -> Self
    where
        F: FnOnce(u64, CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let token = parent.child_token();
        let join = tracker.spawn(make(id, token.clone()));
        Self { id, token, join }
    }
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cancellation. The task stops at its next checkpoint.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the task's result.
    pub async fn join(self) -> ClientResult<T> {
        self.join.await.map_err(|e| ClientError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_returns_value() {
        let tracker = TaskTracker::new();
        let root = CancellationToken::new();
        let handle = TaskHandle::spawn(&tracker, &root, |_, _| async { 7 });
        let other = TaskHandle::spawn(&tracker, &root, |id, _| async move { id });
        let other_id = other.id();
        assert_ne!(handle.id(), other_id);
        assert_eq!(handle.join().await.unwrap(), 7);
        assert_eq!(other.join().await.unwrap(), other_id);
    }

    #[tokio::test]
    async fn parent_cancel_reaches_task() {
        let tracker = TaskTracker::new();
        let root = CancellationToken::new();
        let handle = TaskHandle::spawn(&tracker, &root, |_, token| async move {
            token.cancelled().await;
            "stopped"
        });
        root.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.join().await.unwrap(), "stopped");
    }

    #[tokio::test]
    async fn task_cancel_does_not_touch_parent() {
        let tracker = TaskTracker::new();
        let root = CancellationToken::new();
        let handle =
            TaskHandle::spawn(&tracker, &root, |_, token| async move { token.is_cancelled() });
        handle.cancel();
        assert!(!root.is_cancelled());
        tracker.close();
        tracker.wait().await;
        assert!(handle.is_finished());
    }
}
