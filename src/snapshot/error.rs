//! Errors that end a snapshot run.

use thiserror::Error;

/// Run-level failure. Expected outcomes (skips, selection misses) are
/// reported through [`RunResult`](super::RunResult) instead.
#[derive(Debug, Error)]
pub enum JobError {
    /// Upstream API exhausted its retries or rejected the request.
    #[error("data source unavailable: {0}")]
    DataSourceUnavailable(#[from] tradier_client::Error),

    /// Writing or committing the staged rows failed; nothing was persisted.
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}
