use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

/// An error that controls the flow of a retried operation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateError {
    /// The control flow should retry if possible.
    ///
    /// See: [`retry_if_possible`]
    #[error("{0:#}")]
    Retry(anyhow::Error),
    /// The control flow should wait for the given delay, then retry if possible.
    #[error("{err:#} (retry after {secs}s)", err = .1, secs = .0.as_secs())]
    RetryAfter(Duration, anyhow::Error),
    /// The control flow should exit immediately.
    #[error("{0:#}")]
    Cancelled(anyhow::Error),
}

/// The result of a step that may instruct its caller to retry or cancel.
pub type StateResult<T> = Result<T, StateError>;

impl StateError {
    /// Returns `true` if the error allows another attempt.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retry(_) | Self::RetryAfter(..))
    }

    /// Unwraps the underlying error, discarding the control instruction.
    pub fn into_inner(self) -> anyhow::Error {
        match self {
            Self::Retry(err) | Self::RetryAfter(_, err) | Self::Cancelled(err) => err,
        }
    }
}

/// Decides whether retrying is allowed based on a provided retry count and limit.
///
/// # Errors
///
/// Returns [`Err<()>`] if retrying is not allowed, otherwise [`Ok<()>`] is returned.
#[allow(clippy::result_unit_err)]
pub fn retry_if_possible(retry: &mut u8, max_retries: u8) -> Result<(), ()> {
    *retry = retry.saturating_add(1);
    if *retry > max_retries {
        error!("retried for too many times ({max_retries}), stopping!");
        Err(())
    } else {
        warn!("retrying… ({retry} / {max_retries})");
        Ok(())
    }
}
