//! Diagnostic logging setup.
//!
//! Report lines are written through [`Reporter`](crate::report::Reporter);
//! `tracing` carries diagnostics only and always writes to stderr. The
//! default filter is `warn`, so unless `RUST_LOG` asks for more, stdout holds
//! nothing but task results.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "warn";

/// Installs the global `tracing` subscriber. Idempotent.
pub fn init_tracing() {
    TRACING_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // Another subscriber may already be installed by an embedding binary.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}
