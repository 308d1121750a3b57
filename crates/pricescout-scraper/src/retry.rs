//! Bounded retry with exponential back-off and jitter for page fetches.
//!
//! Only transient signals are retried: timeouts, HTTP 5xx, and HTTP 429.
//! A block or any other 4xx is terminal and returned after the first try.

use std::time::Duration;

use pricescout_core::SourceError;
use rand::Rng;

use crate::fetch::{FetchOptions, FetchSession, FetchStatus};

const MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Relative jitter, e.g. `0.3` for ±30%.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            jitter: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based): `base * 2^(retry - 1)`
    /// with jitter, capped at 30 s before jitter.
    #[must_use]
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let computed = base_ms
            .saturating_mul(1u64 << retry.saturating_sub(1).min(10))
            .min(MAX_DELAY_MS);
        if computed == 0 || self.jitter <= 0.0 {
            return Duration::from_millis(computed);
        }
        let factor = 1.0 + rand::rng().random_range(-self.jitter..=self.jitter);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (computed as f64 * factor) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Whether a fetch outcome is worth another attempt.
#[must_use]
pub fn is_transient(status: FetchStatus) -> bool {
    matches!(
        status,
        FetchStatus::Timeout | FetchStatus::HttpError(429 | 500..=599)
    )
}

/// Map the last failed fetch outcome to the error recorded for the source.
#[must_use]
pub fn classify_failure(status: FetchStatus) -> SourceError {
    match status {
        FetchStatus::Timeout => SourceError::Timeout,
        FetchStatus::Blocked | FetchStatus::HttpError(429) => SourceError::Blocked,
        FetchStatus::HttpError(code) => SourceError::Unavailable {
            detail: format!("HTTP {code}"),
        },
        FetchStatus::Success => SourceError::Unavailable {
            detail: "fetch reported success without a page".to_string(),
        },
    }
}

/// Fetch `url`, retrying transient failures per `policy`.
///
/// # Errors
///
/// Returns the status of the last attempt when it was terminal or when
/// attempts ran out.
pub async fn fetch_with_retry(
    session: &mut FetchSession,
    url: &str,
    options: &FetchOptions,
    policy: &RetryPolicy,
) -> Result<String, FetchStatus> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let response = session.fetch(url, options).await;
        if response.status == FetchStatus::Success {
            return Ok(response.html);
        }
        if !is_transient(response.status) || attempt >= max_attempts {
            tracing::debug!(
                url,
                attempt,
                status = ?response.status,
                "fetch failed; giving up"
            );
            return Err(response.status);
        }

        let delay = policy.delay_before_retry(attempt);
        tracing::warn!(
            url,
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            status = ?response.status,
            "transient fetch failure; retrying after back-off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
