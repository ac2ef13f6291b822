//! Deferred, cancellable work.
//!
//! The release accessor never touches the disk on the caller's path. It hands
//! a flush closure to a [`TaskScheduler`] and keeps the returned
//! [`ScheduledTask`] so the flush can be cancelled and rescheduled while a
//! burst of writes is still arriving.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a task that has been scheduled but may not have run yet.
pub trait ScheduledTask: Send + Sync {
    /// Prevent the task from running if it has not started.
    ///
    /// A task that already started runs to completion.
    fn cancel(&self);
}

/// Runs tasks after a delay.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task) -> Box<dyn ScheduledTask>;
}

/// [`TaskScheduler`] backed by a tokio runtime.
///
/// The delay is a tokio timer; the task body runs on the blocking pool
/// because flushes perform synchronous storage I/O.
#[derive(Clone)]
pub struct TokioTaskScheduler {
    handle: Handle,
}

impl TokioTaskScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl TaskScheduler for TokioTaskScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Box<dyn ScheduledTask> {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                tracing::error!(error = %e, "scheduled task failed");
            }
        });
        Box::new(TokioScheduledTask {
            abort: join.abort_handle(),
        })
    }
}

struct TokioScheduledTask {
    abort: AbortHandle,
}

impl ScheduledTask for TokioScheduledTask {
    fn cancel(&self) {
        self.abort.abort();
    }
}
