//! Bounded task admission.
//!
//! A counted semaphore with FIFO queueing. At most `width` admitted tasks
//! run at any instant; waiters are admitted in submission order. Completion
//! order is unconstrained.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// A work-submission primitive with a fixed concurrency width.
///
/// Two independent limiters are used by the pipeline: one for upstream
/// provider calls and a narrower one for pair-level computations.
#[derive(Clone)]
pub struct TaskLimiter {
    permits: Arc<Semaphore>,
    width: usize,
}

impl TaskLimiter {
    pub fn new(width: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Permits not currently held by running tasks.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `task` once a permit is available. Waiters are served FIFO
    /// (tokio semaphore fairness); the permit is released when the task
    /// completes or is dropped.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("limiter semaphore never closes");
        task.await
    }
}
