//! Periodic Key Vault secret fetch.

use crate::config::{Environment, KeyVaultConfig};
use crate::report::Reporter;
use crate::vault::{SecretSource, SecretSourceFactory};
use crate::{ProbeError, Result, Task};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fetches one named secret every cycle and reports its value.
///
/// The value is printed as-is. This is a demonstration of ambient
/// authentication, not a secure-handling path.
pub struct SecretFetcher {
    env: Arc<dyn Environment>,
    reporter: Arc<dyn Reporter>,
    factory: SecretSourceFactory,
    state: Option<Initialized>,
}

struct Initialized {
    secret_name: String,
    source: Box<dyn SecretSource>,
}

impl SecretFetcher {
    /// Creates an uninitialized fetcher.
    ///
    /// Configuration is read from `env` when [`Task::init`] runs.
    pub fn new(
        env: Arc<dyn Environment>,
        reporter: Arc<dyn Reporter>,
        factory: SecretSourceFactory,
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

#[async_trait]
impl Task for SecretFetcher {
    fn name(&self) -> &str {
        "keyvault"
    }

    async fn init(&mut self) -> Result<()> {
        let config = KeyVaultConfig::from_env(&*self.env)?;
        let source = (self.factory)(&config)?;

        debug!(
            vault_url = %config.vault_url,
            secret = %config.secret_name,
            backend = source.name(),
            "key vault task initialized"
        );

        self.state = Some(Initialized {
            secret_name: config.secret_name,
            source,
        });
        Ok(())
    }

    async fn run_once(&mut self) {
        let Some(state) = &self.state else {
            let err = ProbeError::NotInitialized(self.name().to_string());
            self.reporter.err(&format!("Error: {}", err));
            return;
        };

        match state.source.get_secret(&state.secret_name).await {
            Ok(value) => self.reporter.out(&format!("Secret: {}", value)),
            Err(e) => self.reporter.err(&format!(
                "Error fetching secret {}: {}",
                state.secret_name, e
            )),
        }
    }
}
