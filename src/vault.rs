//! Key-vault capability.
//!
//! A [`SecretSource`] resolves the current value of a named secret using
//! whatever ambient identity the implementation was built with. The crate
//! never sees a credential; the vault client does.

use crate::config::KeyVaultConfig;
use crate::Result;
use async_trait::async_trait;

/// Read access to a secret store.
///
/// # Errors
///
/// Implementations map their failures onto:
///
/// - [`ProbeError::SecretNotFound`](crate::ProbeError::SecretNotFound)
/// - [`ProbeError::Unauthorized`](crate::ProbeError::Unauthorized)
/// - [`ProbeError::Unreachable`](crate::ProbeError::Unreachable)
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Returns the backend name (e.g., "azurekeyvault", "mock").
    fn name(&self) -> &str;

    /// Fetches the current value of `name`.
    async fn get_secret(&self, name: &str) -> Result<String>;
}

/// Builds a [`SecretSource`] for a validated configuration.
///
/// Called once, from the key-vault task's `init`.
pub type SecretSourceFactory =
    Box<dyn Fn(&KeyVaultConfig) -> Result<Box<dyn SecretSource>> + Send + Sync>;
