//! Process lifecycle: init gate, shutdown wiring, periodic loop.

use crate::config::DEFAULT_INTERVAL;
use crate::report::Reporter;
use crate::runner::PeriodicRunner;
use crate::{signal, ProbeError, Result, Task};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns an ordered set of tasks and drives them until shutdown.
///
/// Startup is all-or-nothing: every task is initialized in registration
/// order and the first failure aborts the whole run before any cycle.
/// Once running, per-cycle failures stay inside each task.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use wkldid::backends::mock::{MemoryReporter, MockSecretSource};
/// use wkldid::tasks::SecretFetcher;
/// use wkldid::Supervisor;
///
/// #[tokio::main]
/// async fn main() {
///     let env: std::collections::HashMap<String, String> = [
///         ("KEYVAULT_URL", "https://kv.example"),
///         ("KEYVAULT_SECRET_NAME", "mysecret"),
///     ]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
///
///     let source = MockSecretSource::new();
///     source.set_secret("mysecret", "s3cr3t").await;
///     let reporter = Arc::new(MemoryReporter::new());
///
///     Supervisor::new(reporter.clone())
///         .with_task(SecretFetcher::new(Arc::new(env), reporter.clone(), source.factory()))
///         .run_until(tokio::time::sleep(Duration::from_millis(10)))
///         .await
///         .unwrap();
///
///     assert_eq!(reporter.out_lines()[0], "Secret: s3cr3t");
/// }
/// ```
pub struct Supervisor {
    tasks: Vec<Box<dyn Task>>,
    interval: Duration,
    reporter: Arc<dyn Reporter>,
}

impl Supervisor {
    /// Creates a supervisor with no tasks and the default 15 second interval.
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            tasks: Vec::new(),
            interval: DEFAULT_INTERVAL,
            reporter,
        }
    }

    /// Appends a task. Tasks run in the order they are added.
    pub fn with_task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    /// Sets the pause between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Names of the registered tasks, in run order.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Initializes every task in order, stopping at the first failure.
    ///
    /// The failure is reported on the error channel before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::TaskOperation`] wrapping the failing task's error.
    pub async fn init_all(&mut self) -> Result<()> {
        for task in self.tasks.iter_mut() {
            debug!(task = task.name(), "initializing task");
            if let Err(e) = task.init().await {
                let err = ProbeError::task_op(task.name(), "init", e);
                self.reporter.err(&format!("Error: {}", err));
                return Err(err);
            }
        }
        Ok(())
    }

    /// Initializes all tasks, installs SIGINT/SIGTERM listeners and runs
    /// until a signal arrives.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::TaskOperation`]: A task failed to initialize
    /// - [`ProbeError::Io`]: Signal listeners could not be registered
    pub async fn run(mut self) -> Result<()> {
        self.init_all().await?;
        let shutdown = signal::install()?;
        self.run_loop(shutdown).await;
        Ok(())
    }

    /// Like [`run`](Self::run), but stops when `shutdown` completes instead of
    /// on an OS signal.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::TaskOperation`] if a task failed to initialize.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.init_all().await?;
        self.run_loop(shutdown).await;
        Ok(())
    }

    async fn run_loop<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();

        let watcher = {
            let token = token.clone();
            let reporter = Arc::clone(&self.reporter);
            tokio::spawn(async move {
                shutdown.await;
                token.cancel();
                reporter.out("Shutting down...");
            })
        };

        info!(tasks = ?self.task_names(), interval = ?self.interval, "starting periodic loop");

        let cycles = PeriodicRunner::new(self.tasks, self.reporter)
            .with_interval(self.interval)
            .run(token)
            .await;

        // The token is only cancelled by the watcher, so it has already finished.
        if let Err(e) = watcher.await {
            warn!(error = %e, "shutdown watcher failed");
        }
        info!(cycles, "periodic loop stopped");
    }
}
