//! Standalone Key Vault probe.

use std::process::ExitCode;
use std::sync::Arc;
use wkldid::backends::azure::AzureKeyVault;
use wkldid::config::ProcessEnv;
use wkldid::report::{Reporter, StdReporter};
use wkldid::tasks::SecretFetcher;
use wkldid::Supervisor;

#[tokio::main]
async fn main() -> ExitCode {
    wkldid::logging::init_tracing();

    let reporter: Arc<dyn Reporter> = Arc::new(StdReporter);
    let task = SecretFetcher::new(
        Arc::new(ProcessEnv),
        Arc::clone(&reporter),
        AzureKeyVault::factory(),
    );

    match Supervisor::new(Arc::clone(&reporter)).with_task(task).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(wkldid::ProbeError::TaskOperation { .. }) => ExitCode::FAILURE,
        Err(e) => {
            reporter.err(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
