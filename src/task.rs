//! Task trait for periodic probes.
//!
//! A task is initialized once and then run once per cycle by the
//! [`PeriodicRunner`](crate::runner::PeriodicRunner).

use crate::Result;
use async_trait::async_trait;

/// A unit of periodic work.
///
/// # Contract
///
/// - `init` is called exactly once, before any `run_once`. If it fails the
///   supervisor never calls `run_once` on any task.
/// - `run_once` never returns an error. Failures talking to external
///   services are reported on the error channel and the call returns,
///   leaving the next cycle as the implicit retry.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use wkldid::{Result, Task};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Task for Heartbeat {
///     fn name(&self) -> &str {
///         "heartbeat"
///     }
///
///     async fn init(&mut self) -> Result<()> {
///         Ok(())
///     }
///
///     async fn run_once(&mut self) {
///         println!("alive");
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send {
    /// Returns the task name used in report lines (e.g., "keyvault", "sql").
    fn name(&self) -> &str;

    /// Reads configuration and builds clients.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::MissingEnv`](crate::ProbeError::MissingEnv):
    ///   A required environment variable is unset
    /// - [`ProbeError::InvalidConfig`](crate::ProbeError::InvalidConfig):
    ///   A value is present but unusable
    async fn init(&mut self) -> Result<()>;

    /// Performs one unit of work and reports the outcome.
    async fn run_once(&mut self);
}
