//! Task scheduling capability.
//!
//! A scheduler runs independent, boxed units of work; `submit` pairs each unit
//! with a `TaskHandle` that materializes its result later (block, block with a
//! deadline, or poll).

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Instant;

use crate::domain::BatchConfig;
use crate::error::{ForecastError, Result};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run `job` at some point, on any thread.
    fn spawn(&self, job: Job);

    fn submit<T, F>(&self, unit: F) -> TaskHandle<T>
    where
        Self: Sized,
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.spawn(Box::new(move || {
            // The receiver may already be gone after a timeout or cancel.
            let _ = tx.send(unit());
        }));
        TaskHandle { rx }
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn spawn(&self, job: Job) {
        (**self).spawn(job)
    }
}

/// State of a submitted unit as seen from the joining side.
#[derive(Debug)]
pub enum JoinOutcome<T> {
    Ready(T),
    Pending,
    /// The unit ended without producing a result.
    Lost,
}

#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Block until the unit finishes. `None` if it ended without a result.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }

    pub fn wait_until(&self, deadline: Instant) -> JoinOutcome<T> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(timeout) {
            Ok(v) => JoinOutcome::Ready(v),
            Err(RecvTimeoutError::Timeout) => JoinOutcome::Pending,
            Err(RecvTimeoutError::Disconnected) => JoinOutcome::Lost,
        }
    }

    pub fn try_poll(&self) -> JoinOutcome<T> {
        match self.rx.try_recv() {
            Ok(v) => JoinOutcome::Ready(v),
            Err(TryRecvError::Empty) => JoinOutcome::Pending,
            Err(TryRecvError::Disconnected) => JoinOutcome::Lost,
        }
    }
}

/// Runs units on a dedicated rayon pool.
pub struct ThreadPoolScheduler {
    pool: rayon::ThreadPool,
}

impl ThreadPoolScheduler {
    /// `workers = None` uses rayon's default thread count.
    pub fn new(workers: Option<usize>) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("forecast-worker-{i}"))
            .panic_handler(|_| tracing::error!("forecast worker panicked outside a unit"));
        if let Some(n) = workers {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| ForecastError::Config(format!("Failed to create thread pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_config(config: &BatchConfig) -> Result<Self> {
        Self::new(config.workers)
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Scheduler for ThreadPoolScheduler {
    fn spawn(&self, job: Job) {
        self.pool.spawn(job);
    }
}

/// Runs every unit immediately on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn spawn(&self, job: Job) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn inline_results_are_ready_at_once() {
        let handle = InlineScheduler.submit(|| 6 * 7);
        assert!(matches!(handle.try_poll(), JoinOutcome::Ready(42)));
    }

    #[test]
    fn pool_runs_all_units() {
        let pool = ThreadPoolScheduler::new(Some(3)).unwrap();
        assert_eq!(pool.workers(), 3);
        let handles: Vec<_> = (0..20).map(|i| pool.submit(move || i * 2)).collect();
        let sum: i32 = handles.into_iter().map(|h| h.wait().unwrap()).sum();
        assert_eq!(sum, (0..20).map(|i| i * 2).sum::<i32>());
    }

    #[test]
    fn deadline_reports_pending() {
        let pool = ThreadPoolScheduler::new(Some(1)).unwrap();
        let handle = pool.submit(|| std::thread::sleep(Duration::from_millis(300)));
        let outcome = handle.wait_until(Instant::now() + Duration::from_millis(10));
        assert!(matches!(outcome, JoinOutcome::Pending));
        assert!(handle.wait().is_some());
    }

    #[test]
    fn dropped_unit_is_lost() {
        struct Dropping;
        impl Scheduler for Dropping {
            fn spawn(&self, job: Job) {
                drop(job);
            }
        }
        let handle = Dropping.submit(|| 1);
        assert!(matches!(handle.try_poll(), JoinOutcome::Lost));
    }
}
