//! Combined probe: Key Vault secret fetch, then Azure SQL query, every cycle.

use std::process::ExitCode;
use std::sync::Arc;
use wkldid::backends::azure::{AzureKeyVault, AzureSqlDatabase};
use wkldid::config::{Environment, ProcessEnv};
use wkldid::report::{Reporter, StdReporter};
use wkldid::tasks::{RecordQuerier, SecretFetcher};
use wkldid::Supervisor;

#[tokio::main]
async fn main() -> ExitCode {
    wkldid::logging::init_tracing();

    let env: Arc<dyn Environment> = Arc::new(ProcessEnv);
    let reporter: Arc<dyn Reporter> = Arc::new(StdReporter);

    let supervisor = Supervisor::new(Arc::clone(&reporter))
        .with_task(SecretFetcher::new(
            Arc::clone(&env),
            Arc::clone(&reporter),
            AzureKeyVault::factory(),
        ))
        .with_task(RecordQuerier::new(
            env,
            Arc::clone(&reporter),
            AzureSqlDatabase::factory(),
        ));

    // Init failures are already reported by the supervisor.
    match supervisor.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(wkldid::ProbeError::TaskOperation { .. }) => ExitCode::FAILURE,
        Err(e) => {
            reporter.err(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
