//! Bounded retry for body fetches.
//!
//! Only timeouts are retried; every other failure is returned immediately so
//! a dead short link is not hammered.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Runs `operation` up to `attempts` times in total, retrying only when it
/// fails with a timeout.
///
/// The wait between attempts is `backoff` with ±25% jitter. `attempts` of `0`
/// is treated as `1`.
pub(crate) async fn retry_on_timeout<T, F, Fut>(
    attempts: u32,
    backoff: Duration,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_timeout() || attempt >= attempts {
                    return Err(err);
                }
                let delay = jittered(backoff);
                tracing::warn!(
                    attempt,
                    attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "fetch timed out; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn jittered(backoff: Duration) -> Duration {
    if backoff.is_zero() {
        return Duration::ZERO;
    }
    let base_ms = backoff.as_millis() as f64;
    let factor = rand::random::<f64>() * 0.5 + 0.75;
    Duration::from_millis((base_ms * factor) as u64)
}
