//! Error types for probe tasks.

use thiserror::Error;

/// Result type alias using [`ProbeError`].
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors that can occur while initializing or running a probe task.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// One or more required environment variables are not set.
    #[error("environment variables {0} must be set")]
    MissingEnv(String),

    /// A configuration value is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `run_once` was called on a task whose `init` never succeeded.
    #[error("task not initialized: {0}")]
    NotInitialized(String),

    /// The named secret does not exist in the vault.
    #[error("secret not found: {0}")]
    SecretNotFound(String),

    /// The ambient identity was rejected or no credential could be resolved.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote service could not be reached.
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// Opening a database connection failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Executing the query or reading its result failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Task operation failed with context.
    #[error("{task}: {operation}: {source}")]
    TaskOperation {
        /// Task name
        task: String,
        /// Operation name (init, run)
        operation: String,
        /// Underlying error
        #[source]
        source: Box<ProbeError>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProbeError {
    /// Wraps an error with the task and operation that produced it.
    ///
    /// # Example
    ///
    /// ```
    /// use wkldid::ProbeError;
    ///
    /// let err = ProbeError::MissingEnv("KEYVAULT_URL or KEYVAULT_SECRET_NAME".to_string());
    /// let wrapped = ProbeError::task_op("keyvault", "init", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "keyvault: init: environment variables KEYVAULT_URL or KEYVAULT_SECRET_NAME must be set"
    /// );
    /// ```
    pub fn task_op(
        task: impl Into<String>,
        operation: impl Into<String>,
        err: ProbeError,
    ) -> Self {
        Self::TaskOperation {
            task: task.into(),
            operation: operation.into(),
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = ProbeError::SecretNotFound("mysecret".to_string());
        assert_eq!(err.to_string(), "secret not found: mysecret");
    }

    #[test]
    fn test_task_operation_error() {
        let inner = ProbeError::Connect("db.example:1433 refused".to_string());
        let err = ProbeError::task_op("sql", "init", inner);

        let error_string = err.to_string();
        assert!(error_string.starts_with("sql: init: "));
        assert!(error_string.contains("db.example:1433"));
    }

    #[test]
    fn test_error_source_chain() {
        let inner = ProbeError::Query("invalid object name".to_string());
        let outer = ProbeError::task_op("sql", "run", inner);

        assert!(outer.source().is_some());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: ProbeError = io.into();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
