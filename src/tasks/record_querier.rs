//! Periodic read-only SQL query.

use crate::config::{Environment, SqlConfig};
use crate::database::{Database, DatabaseFactory, ProductRow, PRODUCT_QUERY};
use crate::report::Reporter;
use crate::{ProbeError, Result, Task};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Runs [`PRODUCT_QUERY`] on a fresh connection every cycle and reports the
/// first row.
///
/// An empty result set reports nothing.
pub struct RecordQuerier {
    env: Arc<dyn Environment>,
    reporter: Arc<dyn Reporter>,
    factory: DatabaseFactory,
    state: Option<Initialized>,
}

struct Initialized {
    database_name: String,
    database: Box<dyn Database>,
}

impl RecordQuerier {
    /// Creates an uninitialized querier.
    ///
    /// Configuration is read from `env` when [`Task::init`] runs.
    pub fn new(
        env: Arc<dyn Environment>,
        reporter: Arc<dyn Reporter>,
        factory: DatabaseFactory,
    ) -> Self {
        Self {
            env,
            reporter,
            factory,
            state: None,
        }
    }

    /// Returns `true` once `init` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }
}

/// Opens a connection, runs the query and drops the connection on every path.
async fn query_first(database: &dyn Database) -> Result<Option<ProductRow>> {
    let mut connection = database.connect().await?;
    connection.first_row(PRODUCT_QUERY).await
}

#[async_trait]
impl Task for RecordQuerier {
    fn name(&self) -> &str {
        "sql"
    }

    async fn init(&mut self) -> Result<()> {
        let config = SqlConfig::from_env(&*self.env)?;
        let database = (self.factory)(&config)?;

        debug!(
            server = %config.server,
            database = %config.database,
            backend = database.name(),
            "sql task initialized"
        );

        self.state = Some(Initialized {
            database_name: config.database,
            database,
        });
        Ok(())
    }

    async fn run_once(&mut self) {
        let Some(state) = &self.state else {
            let err = ProbeError::NotInitialized(self.name().to_string());
            self.reporter.err(&format!("Error: {}", err));
            return;
        };

        match query_first(&*state.database).await {
            Ok(Some(row)) => self.reporter.out(&row.to_string()),
            Ok(None) => debug!(database = %state.database_name, "query returned no rows"),
            Err(e) => self.reporter.err(&format!(
                "Error querying {}: {}",
                state.database_name, e
            )),
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::backends::mock::{MemoryReporter, MockDatabase};
    use crate::config::{SQL_DATABASE_NAME, SQL_SERVER_FQDN};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Arc<dyn Environment> {
        Arc::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn full_env() -> Arc<dyn Environment> {
        env(&[(SQL_SERVER_FQDN, "db.example"), (SQL_DATABASE_NAME, "salesdb")])
    }

    #[tokio::test]
    async fn test_query_reports_row() {
        let database = MockDatabase::new();
        database.set_row(ProductRow::new("Bikes", "Mountain-100")).await;
        let reporter = Arc::new(MemoryReporter::new());

        let mut task = RecordQuerier::new(full_env(), reporter.clone(), database.factory());
        task.init().await.unwrap();
        task.run_once().await;

        assert_eq!(
            reporter.out_lines(),
            vec!["Category Name: Bikes, Product Name: Mountain-100"]
        );
        assert_eq!(database.queries(), vec![PRODUCT_QUERY.to_string()]);
    }

    #[tokio::test]
    async fn test_empty_result_is_silent() {
        let database = MockDatabase::new();
        let reporter = Arc::new(MemoryReporter::new());

        let mut task = RecordQuerier::new(full_env(), reporter.clone(), database.factory());
        task.init().await.unwrap();
        task.run_once().await;

        assert!(reporter.out_lines().is_empty());
        assert!(reporter.err_lines().is_empty());
        assert_eq!(database.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_connection_released_every_cycle() {
        let database = MockDatabase::new();
        database.set_row(ProductRow::new("Bikes", "Mountain-100")).await;
        let reporter = Arc::new(MemoryReporter::new());

        let mut task = RecordQuerier::new(full_env(), reporter.clone(), database.factory());
        task.init().await.unwrap();
        for _ in 0..3 {
            task.run_once().await;
            assert_eq!(database.open_connections(), 0);
        }

        assert_eq!(database.connect_count(), 3);
    }

    #[tokio::test]
    async fn test_query_error_releases_connection() {
        let database = MockDatabase::new();
        database
            .fail_query_with(ProbeError::Query("Invalid object name 'SalesLT.Product'".to_string()))
            .await;
        let reporter = Arc::new(MemoryReporter::new());

        let mut task = RecordQuerier::new(full_env(), reporter.clone(), database.factory());
        task.init().await.unwrap();
        task.run_once().await;

        let errors = reporter.err_lines();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error querying salesdb: "));
        assert_eq!(database.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_error_is_reported() {
        let database = MockDatabase::new();
        database
            .fail_connect_with(ProbeError::Connect("db.example:1433 unreachable".to_string()))
            .await;
        let reporter = Arc::new(MemoryReporter::new());

        let mut task = RecordQuerier::new(full_env(), reporter.clone(), database.factory());
        task.init().await.unwrap();
        task.run_once().await;

        assert!(reporter.err_lines()[0].contains("db.example:1433 unreachable"));
        assert!(database.queries().is_empty());
    }

    #[tokio::test]
    async fn test_run_before_init_reports_error() {
        let database = MockDatabase::new();
        database.set_row(ProductRow::new("Bikes", "Mountain-100")).await;
        let reporter = Arc::new(MemoryReporter::new());

        let mut task = RecordQuerier::new(full_env(), reporter.clone(), database.factory());
        task.run_once().await;

        assert_eq!(database.connect_count(), 0);
        assert!(reporter.out_lines().is_empty());
        let errors = reporter.err_lines();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("task not initialized: sql"));
    }

    #[tokio::test]
    async fn test_init_fails_without_env() {
        let database = MockDatabase::new();
        let reporter = Arc::new(MemoryReporter::new());

        let cases = [
            env(&[]),
            env(&[(SQL_SERVER_FQDN, "db.example")]),
            env(&[(SQL_DATABASE_NAME, "salesdb")]),
        ];

        for env in cases {
            let mut task = RecordQuerier::new(env, reporter.clone(), database.factory());
            assert!(matches!(task.init().await, Err(ProbeError::MissingEnv(_))));
            assert!(!task.is_initialized());
        }

        assert_eq!(database.connect_count(), 0);
    }
}
