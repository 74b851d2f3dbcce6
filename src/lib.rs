//! wkldid - periodic workload-identity probe.
//!
//! Proves that ambient (managed / workload identity) authentication works end
//! to end by fetching a Key Vault secret and running a read-only Azure SQL
//! query every 15 seconds, without any secret configured in the process.
//!
//! # Features
//!
//! - **Ambient credentials**: `DefaultAzureCredential` for both services
//! - **Isolated tasks**: a failing service never stops the other
//! - **Graceful shutdown**: SIGINT/SIGTERM end the loop after the current cycle
//! - **Testable seams**: capability traits with in-memory mocks
//!
//! # Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "azure")]
//! # async fn demo() -> wkldid::Result<()> {
//! use std::sync::Arc;
//! use wkldid::backends::azure::{AzureKeyVault, AzureSqlDatabase};
//! use wkldid::config::ProcessEnv;
//! use wkldid::report::StdReporter;
//! use wkldid::tasks::{RecordQuerier, SecretFetcher};
//! use wkldid::Supervisor;
//!
//! let env = Arc::new(ProcessEnv);
//! let reporter = Arc::new(StdReporter);
//!
//! Supervisor::new(reporter.clone())
//!     .with_task(SecretFetcher::new(env.clone(), reporter.clone(), AzureKeyVault::factory()))
//!     .with_task(RecordQuerier::new(env, reporter, AzureSqlDatabase::factory()))
//!     .run()
//!     .await
//! # }
//! ```
//!
//! # Environment
//!
//! | Variable | Used by |
//! |----------|---------|
//! | `KEYVAULT_URL` | [`tasks::SecretFetcher`] |
//! | `KEYVAULT_SECRET_NAME` | [`tasks::SecretFetcher`] |
//! | `SQL_SERVER_FQDN` | [`tasks::RecordQuerier`] |
//! | `SQL_DATABASE_NAME` | [`tasks::RecordQuerier`] |
//! | `RUST_LOG` | diagnostics filter (default `warn`) |
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `mock` | yes | [`backends::mock`] in-memory capabilities |
//! | `azure` | no | [`backends::azure`] and the `wkldid`, `wkldid-kv`, `wkldid-sql` binaries |

pub mod backends;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod report;
pub mod runner;
pub mod signal;
pub mod supervisor;
pub mod task;
pub mod tasks;
pub mod validation;
pub mod vault;

pub use error::{ProbeError, Result};
pub use runner::PeriodicRunner;
pub use supervisor::Supervisor;
pub use task::Task;
