//! Azure Key Vault secret source.

use super::classify_http_failure;
use crate::config::KeyVaultConfig;
use crate::vault::{SecretSource, SecretSourceFactory};
use crate::{ProbeError, Result};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_security_keyvault::SecretClient;
use std::sync::Arc;
use tracing::debug;

/// Azure Key Vault secret source.
///
/// Authenticates with `DefaultAzureCredential`, so the identity comes from
/// the hosting environment (managed identity, workload identity, Azure CLI).
pub struct AzureKeyVault {
    client: SecretClient,
    vault_url: String,
}

impl AzureKeyVault {
    /// Creates a client for `config.vault_url`.
    ///
    /// No network call is made here; the credential is resolved on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidConfig`] if the SDK rejects the URL and
    /// [`ProbeError::Unauthorized`] if no credential chain can be built.
    pub fn new(config: &KeyVaultConfig) -> Result<Self> {
        let credential = super::default_credential()?;
        Self::with_credential(config, credential)
    }

    /// Creates a client that authenticates with `credential`.
    pub fn with_credential(
        config: &KeyVaultConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        let client = SecretClient::new(&config.vault_url, credential).map_err(|e| {
            ProbeError::InvalidConfig(format!("failed to create secret client: {}", e))
        })?;

        Ok(Self {
            client,
            vault_url: config.vault_url.clone(),
        })
    }

    /// Returns a factory suitable for [`SecretFetcher`](crate::tasks::SecretFetcher).
    pub fn factory() -> SecretSourceFactory {
        Box::new(|config| Ok(Box::new(AzureKeyVault::new(config)?) as Box<dyn SecretSource>))
    }
}

#[async_trait]
impl SecretSource for AzureKeyVault {
    fn name(&self) -> &str {
        "azurekeyvault"
    }

    async fn get_secret(&self, name: &str) -> Result<String> {
        debug!(vault_url = %self.vault_url, secret = name, "fetching secret");

        let secret = self
            .client
            .get(name)
            .await
            .map_err(|e| classify_http_failure(name, &e.to_string()))?;

        Ok(secret.value)
    }
}
