//! Azure Key Vault and Azure SQL backends.
//!
//! Both backends authenticate with `DefaultAzureCredential`, which tries, in
//! order:
//! - Environment variables (AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET)
//! - Workload identity federation (AZURE_FEDERATED_TOKEN_FILE)
//! - Managed Identity (when running in Azure)
//! - Azure CLI credentials
//!
//! No secret is ever passed in by this crate.

mod keyvault;
mod sql;

pub use keyvault::AzureKeyVault;
pub use sql::{AzureSqlConnection, AzureSqlDatabase};

use crate::{ProbeError, Result};
use azure_core::auth::TokenCredential;
use azure_identity::DefaultAzureCredential;
use std::sync::Arc;

/// Builds the ambient credential chain shared by both backends.
pub(crate) fn default_credential() -> Result<Arc<dyn TokenCredential>> {
    let credential = DefaultAzureCredential::create(Default::default()).map_err(|e| {
        ProbeError::Unauthorized(format!("failed to create Azure credentials: {}", e))
    })?;
    Ok(Arc::new(credential))
}

/// Maps an Azure HTTP failure message onto the key-vault error taxonomy.
pub(crate) fn classify_http_failure(name: &str, message: &str) -> ProbeError {
    let has = |needle: &str| message.contains(needle);

    if has("SecretNotFound") || has("404") {
        ProbeError::SecretNotFound(name.to_string())
    } else if has("401") || has("403") || has("Forbidden") || has("Unauthorized") || has("credential") {
        ProbeError::Unauthorized(message.to_string())
    } else {
        ProbeError::Unreachable(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = classify_http_failure("mysecret", "HttpResponse(404, SecretNotFound)");
        assert!(matches!(err, ProbeError::SecretNotFound(ref n) if n == "mysecret"));
    }

    #[test]
    fn test_classify_forbidden() {
        let err = classify_http_failure("mysecret", "HttpResponse(403, Forbidden)");
        assert!(matches!(err, ProbeError::Unauthorized(_)));

        let err = classify_http_failure("mysecret", "no credential sources were available");
        assert!(matches!(err, ProbeError::Unauthorized(_)));
    }

    #[test]
    fn test_classify_transport() {
        let err = classify_http_failure("mysecret", "error sending request: dns error");
        assert!(matches!(err, ProbeError::Unreachable(_)));
    }
}
