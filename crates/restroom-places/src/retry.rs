//! Retry with exponential back-off and jitter for the Places client.
//!
//! [`retry_with_backoff`] retries transient failures (network errors, 5xx,
//! `UNKNOWN_ERROR`). Quota exhaustion, denied keys and malformed responses
//! are returned immediately; retrying them only burns quota.

use std::future::Future;
use std::time::Duration;

use crate::error::PlacesError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &PlacesError) -> bool {
    match err {
        PlacesError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        PlacesError::Api { status, .. } => status == "UNKNOWN_ERROR",
        PlacesError::QuotaExceeded(_)
        | PlacesError::RequestDenied(_)
        | PlacesError::Deserialize { .. }
        | PlacesError::InvalidBaseUrl(_) => false,
    }
}

const MAX_DELAY_MS: u64 = 10_000;

/// Back-off before retry number `attempt` (1-based), before jitter.
fn base_delay_ms(attempt: u32, backoff_base_ms: u64) -> u64 {
    backoff_base_ms
        .saturating_mul(1u64 << attempt.saturating_sub(1).min(10))
        .min(MAX_DELAY_MS)
}

/// Longest total sleep `retry_with_backoff` can add across `max_retries`
/// retries, jitter included.
pub(crate) fn max_total_backoff(max_retries: u32, backoff_base_ms: u64) -> Duration {
    let total_ms = (1..=max_retries)
        .map(|attempt| base_delay_ms(attempt, backoff_base_ms))
        .fold(0u64, u64::saturating_add);
    // Jitter stretches each sleep by at most 25 %.
    Duration::from_millis(total_ms.saturating_add(total_ms.div_ceil(4)))
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Sleeps `backoff_base_ms × 2^(attempt-1)` ± 25 % jitter between attempts,
/// capped at 10 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, PlacesError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PlacesError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = base_delay_ms(attempt, backoff_base_ms);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Places transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
