//! Bounded retry with a fixed delay.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ApiError;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

/// Run `operation` until it succeeds, fails with a non-transient error, or
/// runs out of attempts.
///
/// # Errors
///
/// Returns the last error seen.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Transient failure, retrying"
                );
                sleep(policy.delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    const FAST: RetryPolicy = RetryPolicy {
        attempts: 3,
        delay: Duration::from_millis(1),
    };

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(FAST, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ApiError::Timeout(Duration::from_secs(1)))
            } else {
                Ok("catalog")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "catalog");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(FAST, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Timeout(Duration::from_secs(1)))
        })
        .await;

        assert!(matches!(result, Err(ApiError::Timeout(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_api_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(FAST, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ApiError::Api { status: 500, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
