//! Input validation for configuration values read from the environment.

use crate::{ProbeError, Result};

/// Maximum length of a Key Vault secret name.
const MAX_SECRET_NAME_LENGTH: usize = 127;

/// Maximum length of a DNS host name.
const MAX_HOST_LENGTH: usize = 253;

/// Validates a Key Vault endpoint URL.
///
/// The URL must use `http` or `https` and name a host.
///
/// # Example
///
/// ```
/// use wkldid::validation::validate_vault_url;
///
/// assert!(validate_vault_url("https://myvault.vault.azure.net/").is_ok());
/// assert!(validate_vault_url("myvault.vault.azure.net").is_err());
/// assert!(validate_vault_url("https://").is_err());
/// ```
pub fn validate_vault_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            ProbeError::InvalidConfig(format!("vault URL must start with https:// ({})", url))
        })?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ProbeError::InvalidConfig(format!(
            "vault URL has no host ({})",
            url
        )));
    }

    validate_host(host)
}

/// Validates a Key Vault secret name.
///
/// Key Vault accepts 1-127 characters drawn from ASCII letters, digits and `-`.
///
/// # Example
///
/// ```
/// use wkldid::validation::validate_secret_name;
///
/// assert!(validate_secret_name("db-password").is_ok());
/// assert!(validate_secret_name("").is_err());
/// assert!(validate_secret_name("db_password").is_err());
/// ```
pub fn validate_secret_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ProbeError::InvalidConfig(
            "secret name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_SECRET_NAME_LENGTH {
        return Err(ProbeError::InvalidConfig(format!(
            "secret name exceeds maximum length of {} characters",
            MAX_SECRET_NAME_LENGTH
        )));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ProbeError::InvalidConfig(format!(
            "secret name may only contain letters, digits and '-' ({})",
            name
        )));
    }

    Ok(())
}

/// Validates a server host name.
pub fn validate_host(host: &str) -> Result<()> {
    if host.is_empty() {
        return Err(ProbeError::InvalidConfig(
            "host cannot be empty".to_string(),
        ));
    }

    if host.len() > MAX_HOST_LENGTH {
        return Err(ProbeError::InvalidConfig(format!(
            "host exceeds maximum length of {} characters",
            MAX_HOST_LENGTH
        )));
    }

    if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ProbeError::InvalidConfig(format!(
            "host contains whitespace or control characters ({:?})",
            host
        )));
    }

    Ok(())
}

/// Validates a database name.
pub fn validate_database_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ProbeError::InvalidConfig(
            "database name cannot be empty".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ProbeError::InvalidConfig(
            "database name contains control characters".to_string(),
        ));
    }

    Ok(())
}
