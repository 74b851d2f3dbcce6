//! Configuration read from the process environment.

use crate::validation::{validate_database_name, validate_host, validate_secret_name, validate_vault_url};
use crate::{ProbeError, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Key Vault endpoint, e.g. `https://myvault.vault.azure.net/`.
pub const KEYVAULT_URL: &str = "KEYVAULT_URL";
/// Name of the secret fetched every cycle.
pub const KEYVAULT_SECRET_NAME: &str = "KEYVAULT_SECRET_NAME";
/// Fully qualified SQL server host, e.g. `myserver.database.windows.net`.
pub const SQL_SERVER_FQDN: &str = "SQL_SERVER_FQDN";
/// Database queried every cycle.
pub const SQL_DATABASE_NAME: &str = "SQL_DATABASE_NAME";

/// Pause between the end of one cycle and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

/// TDS port used by Azure SQL Database.
pub const SQL_PORT: u16 = 1433;

/// Token scope requested from the default credential chain for Azure SQL.
pub const SQL_TOKEN_SCOPE: &str = "https://database.windows.net/.default";

/// Source of named configuration values.
///
/// Production code reads the process environment through [`ProcessEnv`];
/// tests substitute a `HashMap`.
pub trait Environment: Send + Sync {
    /// Returns the value of `key`, or `None` if it is unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Settings for the Key Vault task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVaultConfig {
    /// Vault endpoint URL
    pub vault_url: String,
    /// Secret to fetch
    pub secret_name: String,
}

impl KeyVaultConfig {
    /// Reads and validates [`KEYVAULT_URL`] and [`KEYVAULT_SECRET_NAME`].
    ///
    /// # Errors
    ///
    /// - [`ProbeError::MissingEnv`] if either variable is unset
    /// - [`ProbeError::InvalidConfig`] if a value fails validation
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use wkldid::config::KeyVaultConfig;
    ///
    /// let env: HashMap<String, String> = [
    ///     ("KEYVAULT_URL", "https://kv.example"),
    ///     ("KEYVAULT_SECRET_NAME", "mysecret"),
    /// ]
    /// .into_iter()
    /// .map(|(k, v)| (k.to_string(), v.to_string()))
    /// .collect();
    ///
    /// let config = KeyVaultConfig::from_env(&env).unwrap();
    /// assert_eq!(config.secret_name, "mysecret");
    /// ```
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let (Some(vault_url), Some(secret_name)) =
            (env.var(KEYVAULT_URL), env.var(KEYVAULT_SECRET_NAME))
        else {
            return Err(ProbeError::MissingEnv(format!(
                "{} and {}",
                KEYVAULT_URL, KEYVAULT_SECRET_NAME
            )));
        };

        validate_vault_url(&vault_url)?;
        validate_secret_name(&secret_name)?;

        Ok(Self {
            vault_url,
            secret_name,
        })
    }
}

/// Settings for the SQL task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlConfig {
    /// Server host name
    pub server: String,
    /// Database name
    pub database: String,
    /// TDS port (default: 1433)
    pub port: u16,
}

impl SqlConfig {
    /// Reads and validates [`SQL_SERVER_FQDN`] and [`SQL_DATABASE_NAME`].
    ///
    /// # Errors
    ///
    /// - [`ProbeError::MissingEnv`] if either variable is unset
    /// - [`ProbeError::InvalidConfig`] if a value fails validation
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let (Some(server), Some(database)) =
            (env.var(SQL_SERVER_FQDN), env.var(SQL_DATABASE_NAME))
        else {
            return Err(ProbeError::MissingEnv(format!(
                "{} and {}",
                SQL_SERVER_FQDN, SQL_DATABASE_NAME
            )));
        };

        validate_host(&server)?;
        validate_database_name(&database)?;

        Ok(Self {
            server,
            database,
            port: SQL_PORT,
        })
    }

    /// Overrides the TDS port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
