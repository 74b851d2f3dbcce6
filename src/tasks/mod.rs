//! Probe tasks run by the supervisor.

mod record_querier;
mod secret_fetcher;

pub use record_querier::RecordQuerier;
pub use secret_fetcher::SecretFetcher;
