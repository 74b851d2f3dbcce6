//! Mock capabilities for testing.
//!
//! In-memory implementations of [`SecretSource`], [`Database`], [`Reporter`]
//! and [`Task`] with error injection and call counters, so the supervisor
//! and both probe tasks can be exercised without Azure.

use crate::config::{KeyVaultConfig, SqlConfig};
use crate::database::{Connection, Database, DatabaseFactory, ProductRow};
use crate::report::Reporter;
use crate::vault::{SecretSource, SecretSourceFactory};
use crate::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;

/// Mock key vault.
///
/// Clones share state, so a test can keep one handle and give the task a
/// factory built from another.
///
/// # Example
///
/// ```
/// use wkldid::backends::mock::MockSecretSource;
/// use wkldid::vault::SecretSource;
/// use wkldid::ProbeError;
///
/// #[tokio::main]
/// async fn main() {
///     let source = MockSecretSource::new();
///     source.set_secret("mysecret", "s3cr3t").await;
///     assert_eq!(source.get_secret("mysecret").await.unwrap(), "s3cr3t");
///
///     source.fail_with(ProbeError::Unauthorized("test".to_string())).await;
///     assert!(source.get_secret("mysecret").await.is_err());
/// }
/// ```
#[derive(Clone, Default)]
pub struct MockSecretSource {
    secrets: Arc<RwLock<HashMap<String, String>>>,
    get_error: Arc<RwLock<Option<ProbeError>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    fetches: Arc<AtomicUsize>,
    configs: Arc<Mutex<Vec<KeyVaultConfig>>>,
}

impl MockSecretSource {
    /// Creates an empty mock vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces a secret.
    pub async fn set_secret(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().await.insert(name.into(), value.into());
    }

    /// Makes every subsequent fetch fail with `err`.
    pub async fn fail_with(&self, err: ProbeError) {
        *self.get_error.write().await = Some(err);
    }

    /// Clears an injected error.
    pub async fn recover(&self) {
        *self.get_error.write().await = None;
    }

    /// Makes every fetch take `delay` before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Number of `get_secret` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Configurations passed to the factory, in order.
    pub fn configs(&self) -> Vec<KeyVaultConfig> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a factory that hands out clones of this mock.
    pub fn factory(&self) -> SecretSourceFactory {
        let source = self.clone();
        Box::new(move |config| {
            source
                .configs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(config.clone());
            Ok(Box::new(source.clone()) as Box<dyn SecretSource>)
        })
    }
}

#[async_trait]
impl SecretSource for MockSecretSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_secret(&self, name: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref err) = *self.get_error.read().await {
            return Err(ProbeError::Other(anyhow::anyhow!("{}", err)));
        }

        let secrets = self.secrets.read().await;
        secrets
            .get(name)
            .cloned()
            .ok_or_else(|| ProbeError::SecretNotFound(name.to_string()))
    }
}

/// Mock database.
///
/// Tracks how many connections were opened and how many are still open, so
/// tests can check that every cycle releases its connection.
#[derive(Clone, Default)]
pub struct MockDatabase {
    row: Arc<RwLock<Option<ProductRow>>>,
    connect_error: Arc<RwLock<Option<ProbeError>>>,
    query_error: Arc<RwLock<Option<ProbeError>>>,
    connects: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
    configs: Arc<Mutex<Vec<SqlConfig>>>,
}

impl MockDatabase {
    /// Creates a mock database whose query returns no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row returned by every query.
    pub async fn set_row(&self, row: ProductRow) {
        *self.row.write().await = Some(row);
    }

    /// Makes the query return no rows.
    pub async fn clear_row(&self) {
        *self.row.write().await = None;
    }

    /// Makes every subsequent `connect` fail with `err`.
    pub async fn fail_connect_with(&self, err: ProbeError) {
        *self.connect_error.write().await = Some(err);
    }

    /// Makes every subsequent query fail with `err`.
    pub async fn fail_query_with(&self, err: ProbeError) {
        *self.query_error.write().await = Some(err);
    }

    /// Clears injected connect and query errors.
    pub async fn recover(&self) {
        *self.connect_error.write().await = None;
        *self.query_error.write().await = None;
    }

    /// Number of connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of connections not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// SQL text of every executed query, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Configurations passed to the factory, in order.
    pub fn configs(&self) -> Vec<SqlConfig> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns a factory that hands out clones of this mock.
    pub fn factory(&self) -> DatabaseFactory {
        let database = self.clone();
        Box::new(move |config| {
            database
                .configs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(config.clone());
            Ok(Box::new(database.clone()) as Box<dyn Database>)
        })
    }
}

#[async_trait]
impl Database for MockDatabase {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(ref err) = *self.connect_error.read().await {
            return Err(ProbeError::Other(anyhow::anyhow!("{}", err)));
        }

        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            database: self.clone(),
        }))
    }
}

/// Connection handed out by [`MockDatabase`].
pub struct MockConnection {
    database: MockDatabase,
}

#[async_trait]
impl Connection for MockConnection {
    async fn first_row(&mut self, sql: &str) -> Result<Option<ProductRow>> {
        self.database
            .queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_string());

        if let Some(ref err) = *self.database.query_error.read().await {
            return Err(ProbeError::Other(anyhow::anyhow!("{}", err)));
        }

        Ok(self.database.row.read().await.clone())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.database.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Channel a captured line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Output channel (stdout)
    Out,
    /// Error channel (stderr)
    Err,
}

/// Reporter that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(Channel, String)>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written so far, in order, with its channel.
    pub fn lines(&self) -> Vec<(Channel, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Lines written to the output channel.
    pub fn out_lines(&self) -> Vec<String> {
        self.channel(Channel::Out)
    }

    /// Lines written to the error channel.
    pub fn err_lines(&self) -> Vec<String> {
        self.channel(Channel::Err)
    }

    fn channel(&self, channel: Channel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| line)
            .collect()
    }

    fn push(&self, channel: Channel, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel, line.to_string()));
    }
}

impl Reporter for MemoryReporter {
    fn out(&self, line: &str) {
        self.push(Channel::Out, line);
    }

    fn err(&self, line: &str) {
        self.push(Channel::Err, line);
    }
}

/// Task that records each invocation in a shared log.
///
/// Several `MockTask`s sharing one log show the order in which the runner
/// called them.
pub struct MockTask {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
    runs: Arc<AtomicUsize>,

    /// Error to return from `init()`
    pub init_error: Option<ProbeError>,
    /// Panic inside `run_once()` with this message
    pub panic_message: Option<String>,
}

impl MockTask {
    /// Creates a task that appends `name` to `log` on every run.
    pub fn new(name: impl Into<String>, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.into(),
            log,
            runs: Arc::new(AtomicUsize::new(0)),
            init_error: None,
            panic_message: None,
        }
    }

    /// Shared run counter, readable after the task is moved into a runner.
    pub fn runs(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }
}

#[async_trait]
impl Task for MockTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{}:init", self.name));

        match self.init_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn run_once(&mut self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.name.clone());

        if let Some(ref message) = self.panic_message {
            panic!("{}", message);
        }
    }
}
