//! Nullable scheduler: deferred tasks only run when the test says so.

use fedsync_release::{ScheduledTask, Task, TaskScheduler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Entry {
    delay: Duration,
    task: Task,
    cancelled: Arc<AtomicBool>,
}

/// A [`TaskScheduler`] whose clock never advances on its own.
///
/// Scheduled tasks pile up until [`ManualScheduler::run_pending`] fires the
/// ones that were not cancelled. Counts every `schedule` and `cancel` call.
pub struct ManualScheduler {
    queue: Mutex<Vec<Entry>>,
    scheduled: AtomicUsize,
    cancels: Arc<AtomicUsize>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            scheduled: AtomicUsize::new(0),
            cancels: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `schedule` calls so far.
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Number of `cancel` calls so far.
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Tasks scheduled, not cancelled and not yet run.
    pub fn outstanding(&self) -> usize {
        self.queue
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Delays of the outstanding tasks, in scheduling order.
    pub fn outstanding_delays(&self) -> Vec<Duration> {
        self.queue
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.cancelled.load(Ordering::SeqCst))
            .map(|e| e.delay)
            .collect()
    }

    /// Run every outstanding task, as if all their delays elapsed. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let entries: Vec<Entry> = std::mem::take(&mut *self.queue.lock().unwrap());
        let mut ran = 0;
        for entry in entries {
            if !entry.cancelled.load(Ordering::SeqCst) {
                (entry.task)();
                ran += 1;
            }
        }
        ran
    }

    /// Run every queued task, cancelled or not, modelling timers that fired
    /// before their cancellation landed.
    pub fn fire_all(&self) -> usize {
        let entries: Vec<Entry> = std::mem::take(&mut *self.queue.lock().unwrap());
        let count = entries.len();
        for entry in entries {
            (entry.task)();
        }
        count
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Box<dyn ScheduledTask> {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        let cancelled = Arc::new(AtomicBool::new(false));
        self.queue.lock().unwrap().push(Entry {
            delay,
            task,
            cancelled: Arc::clone(&cancelled),
        });
        Box::new(ManualTask {
            cancelled,
            cancels: Arc::clone(&self.cancels),
        })
    }
}

struct ManualTask {
    cancelled: Arc<AtomicBool>,
    cancels: Arc<AtomicUsize>,
}

impl ScheduledTask for ManualTask {
    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_wait_for_run_pending() {
        let scheduler = ManualScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&runs);
        let _task = scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.outstanding(), 1);
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.outstanding(), 0);
    }

    #[test]
    fn cancelled_tasks_are_skipped() {
        let scheduler = ManualScheduler::new();
        let task = scheduler.schedule(Duration::ZERO, Box::new(|| panic!("must not run")));
        task.cancel();
        assert_eq!(scheduler.cancel_count(), 1);
        assert_eq!(scheduler.run_pending(), 0);
    }
}
