//! Detached work that must outlive the hook that started it

use crate::error::OffgridResult;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tracks detached tasks so the host can wait for them before shutdown.
///
/// Spawning never blocks the caller. Task errors are logged and
/// swallowed.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn a detached task
    pub fn spawn<F>(&self, label: String, task: F)
    where
        F: Future<Output = OffgridResult<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            match task.await {
                Ok(()) => debug!("Background task done: {}", label),
                Err(e) => warn!("Background task failed: {}: {}", label, e),
            }
        });

        let mut handles = self.handles();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks not yet finished
    pub fn pending(&self) -> usize {
        self.handles().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every task spawned so far. Returns how many were awaited.
    pub async fn settle(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles());
        let count = handles.len();

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Background task aborted: {}", e);
            }
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OffgridError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn settle_waits_for_spawned_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = Arc::clone(&done);
            tasks.spawn("count".to_string(), async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert_eq!(tasks.settle().await, 3);
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("broken".to_string(), async {
            Err(OffgridError::Storage("disk full".to_string()))
        });

        assert_eq!(tasks.settle().await, 1);
    }
}
