//! Trailing-edge debounce for autosave.
//!
//! A `Debouncer` holds at most one pending job. Scheduling a new job replaces
//! the pending one and restarts the quiet period. Once a job has started it
//! runs to completion; only jobs still waiting are cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Default)]
struct Slot {
    generation: u64,
    job: Option<Job>,
}

pub struct Debouncer {
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
            timer: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().job.is_some()
    }

    /// Replaces any waiting job with `job` and restarts the timer. Must be
    /// called from within a tokio runtime.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (generation, superseded) = {
            let mut slot = self.slot.lock();
            let superseded = slot.job.replace(Box::pin(job)).is_some();
            slot.generation += 1;
            (slot.generation, superseded)
        };
        if superseded && let Some(timer) = self.timer.take() {
            timer.abort();
        }
        trace!(generation, superseded, "scheduled debounced job");

        let slot = Arc::clone(&self.slot);
        let delay = self.delay;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let job = {
                let mut slot = slot.lock();
                if slot.generation == generation {
                    slot.job.take()
                } else {
                    None
                }
            };
            if let Some(job) = job {
                debug!(generation, "running debounced job");
                job.await;
            }
        }));
    }

    /// Drops the waiting job, if any. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        let dropped = self.take_pending().is_some();
        if dropped && let Some(timer) = self.timer.take() {
            timer.abort();
        }
        dropped
    }

    /// Runs the waiting job now, or waits for a job that already started.
    pub async fn flush(&mut self) {
        if let Some(job) = self.take_pending() {
            if let Some(timer) = self.timer.take() {
                timer.abort();
            }
            debug!("flushing debounced job");
            job.await;
            return;
        }

        if let Some(timer) = self.timer.take()
            && let Err(err) = timer.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "debounced job panicked");
        }
    }

    fn take_pending(&self) -> Option<Job> {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.job.take()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let Some(job) = self.take_pending() else {
            return;
        };
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        match Handle::try_current() {
            Ok(handle) => {
                debug!("debouncer dropped with pending job; running it now");
                handle.spawn(job);
            }
            Err(_) => warn!("debouncer dropped outside a runtime; pending job lost"),
        }
    }
}
