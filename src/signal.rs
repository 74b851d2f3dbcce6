//! Termination signal handling.

use crate::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

/// Registers termination signal listeners and returns a future that
/// completes when the first one arrives.
///
/// Listeners are registered before this function returns, so a signal
/// delivered before the future is first polled is not lost.
///
/// - Unix: SIGINT and SIGTERM
/// - Other platforms: Ctrl+C
///
/// # Errors
///
/// Returns [`ProbeError::Io`](crate::ProbeError::Io) if a listener cannot be
/// registered.
#[cfg(unix)]
pub fn install() -> Result<BoxFuture<'static, ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT"),
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    }
    .boxed())
}

/// Registers termination signal listeners and returns a future that
/// completes when the first one arrives.
#[cfg(not(unix))]
pub fn install() -> Result<BoxFuture<'static, ()>> {
    Ok(async move { on_ctrl_c(tokio::signal::ctrl_c().await).await }.boxed())
}

/// Completes on a delivered Ctrl+C. A failed listener never completes, so
/// the process keeps running without a shutdown path.
#[cfg(any(not(unix), test))]
async fn on_ctrl_c(outcome: std::io::Result<()>) {
    match outcome {
        Ok(()) => info!("received Ctrl+C"),
        Err(e) => {
            tracing::warn!(error = %e, "Ctrl+C listener failed; shutdown signal unavailable");
            std::future::pending::<()>().await;
        }
    }
}
