//! Fixed-interval cycle loop.
//!
//! The runner owns an ordered list of initialized tasks. Each cycle calls
//! every task's `run_once` in registration order, then sleeps for the
//! interval. A [`CancellationToken`] stops the loop: it is checked before
//! every cycle and interrupts the sleep, but never an in-flight cycle.

use crate::config::DEFAULT_INTERVAL;
use crate::report::Reporter;
use crate::Task;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs tasks on a fixed interval until cancelled.
pub struct PeriodicRunner {
    tasks: Vec<Box<dyn Task>>,
    interval: Duration,
    reporter: Arc<dyn Reporter>,
}

impl PeriodicRunner {
    /// Creates a runner with the default 15 second interval.
    ///
    /// Tasks must already be initialized.
    pub fn new(tasks: Vec<Box<dyn Task>>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            tasks,
            interval: DEFAULT_INTERVAL,
            reporter,
        }
    }

    /// Sets the pause between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs cycles until `token` is cancelled.
    ///
    /// Returns after the cycle in progress at cancellation time (if any) has
    /// finished. Returns the number of cycles completed.
    pub async fn run(mut self, token: CancellationToken) -> u64 {
        let mut cycles = 0u64;

        while !token.is_cancelled() {
            self.run_cycle().await;
            cycles += 1;
            debug!(cycle = cycles, "cycle complete");

            if token.is_cancelled() {
                break;
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("sleep interrupted by shutdown");
                    self.reporter.err("Sleep interrupted, failed to complete operation");
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(cycles, "runner stopped");
        cycles
    }

    /// Calls `run_once` on every task in order.
    ///
    /// A panicking task is reported and the remaining tasks still run.
    pub async fn run_cycle(&mut self) {
        for task in self.tasks.iter_mut() {
            let outcome = AssertUnwindSafe(task.run_once()).catch_unwind().await;
            if let Err(payload) = outcome {
                self.reporter.err(&format!(
                    "{}: unexpected failure: {}",
                    task.name(),
                    panic_message(payload.as_ref())
                ));
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "panic"
    }
}
