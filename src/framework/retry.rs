//! A loop that repeats an operation until a value is returned, the max retry times is reached, or a stop signal is received.

use super::{StateError, StateResult, retry_if_possible};

use anyhow::Context as _;
use tracing::{debug, error, warn};

/// Runs an operation until it succeeds, is cancelled, or exhausts `max_retries` retries.
///
/// The `name` distinguishes the operation in logs and in the error context. A
/// [`StateError::RetryAfter`] delays the next attempt by its duration.
///
/// # Errors
///
/// Returns the error of a cancelled attempt, or the error of the last attempt once retrying is no longer allowed.
pub async fn retry<T, F, Fut>(name: &str, max_retries: u8, mut f: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StateResult<T>>,
{
    debug!("starting {name}…");
    let mut retry: u8 = 0;

    loop {
        let err = match f().await {
            Ok(value) => {
                debug!("{name} succeeded");
                return Ok(value);
            }
            Err(StateError::Cancelled(err)) => {
                error!("{name} failed: {err:#}");
                return Err(err);
            }
            Err(err) => err,
        };

        warn!("{name} failed: {err}");
        if retry_if_possible(&mut retry, max_retries).is_err() {
            return Err(err.into_inner())
                .with_context(|| format!("{name} gave up after {max_retries} retries"));
        }
        if let StateError::RetryAfter(delay, _) = &err {
            debug!("waiting {}s before retrying {name}…", delay.as_secs());
            tokio::time::sleep(*delay).await;
        }
    }
}
