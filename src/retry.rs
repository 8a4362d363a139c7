//! Bounded-attempt retry executor with fixed inter-attempt delay.
//!
//! Wraps a transport call in a retry loop: short-circuit on first success,
//! sleep a constant [`RetryPolicy::delay`] between attempts, and wrap the
//! final failure in [`Error::RetryExhausted`]. The delay is fixed across
//! attempts; there is no jitter and no backoff.
//!
//! Both the in-flight operation and the inter-attempt sleep race a
//! [`CancellationToken`]; cancellation surfaces as [`Error::Cancelled`]
//! and is never treated as a transient failure eligible for retry.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::RetryPolicy;
use crate::error::{Error, Result};
use crate::response::HttpResponse;

/// Executes operations under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Creates an executor with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invokes `operation` up to the policy's attempt budget.
    ///
    /// Retries only errors that are [`Error::is_retryable`]; anything else
    /// (cancellation, programmer errors) stops the loop immediately and
    /// passes through unwrapped. When every allowed attempt has failed the
    /// last failure is wrapped in [`Error::RetryExhausted`] with the
    /// attempt count, including the single-attempt case, so transport
    /// failures always carry how often they were tried.
    pub async fn execute<F, Fut>(
        &self,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<HttpResponse>>,
    {
        let budget = self.policy.attempt_budget();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                () = cancel.cancelled() => {
                    warn!(attempt, "request cancelled while in flight");
                    return Err(Error::cancelled("request cancelled"));
                }
                outcome = operation() => outcome,
            };

            match outcome {
                Ok(response) => {
                    debug!(attempt, "attempt succeeded");
                    return Ok(response);
                }
                Err(e) if !e.is_retryable() => {
                    error!(attempt, error = %e, "attempt failed with non-retryable error");
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= budget {
                        error!(
                            attempts = attempt,
                            error = %e,
                            "all attempts failed"
                        );
                        return Err(Error::retry_exhausted(attempt, e));
                    }

                    warn!(
                        attempt,
                        budget,
                        delay_ms = %self.policy.delay.as_millis(),
                        error = %e,
                        "attempt failed, retrying after delay"
                    );

                    tokio::select! {
                        () = cancel.cancelled() => {
                            warn!(attempt, "request cancelled while waiting to retry");
                            return Err(Error::cancelled("cancelled while waiting to retry"));
                        }
                        () = tokio::time::sleep(self.policy.delay) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    fn executor(enabled: bool, max_retries: u32, delay_ms: u64) -> RetryExecutor {
        RetryExecutor::new(RetryPolicy {
            enabled,
            max_retries,
            delay: Duration::from_millis(delay_ms),
        })
    }

    fn ok_response() -> HttpResponse {
        HttpResponse {
            status_code: 200,
            ..HttpResponse::default()
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_makes_one_attempt() {
        let attempts = AtomicU32::new(0);
        let result = executor(true, 3, 10)
            .execute(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok(ok_response())
                },
                &CancellationToken::new(),
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fail_twice_then_succeed() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();
        let result = executor(true, 3, 10)
            .execute(
                || async {
                    let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(Error::network("flaky"))
                    } else {
                        Ok(ok_response())
                    }
                },
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.unwrap().status_code, 200);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two inter-attempt delays of 10ms each.
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_exhaustion_wraps_last_failure() {
        let attempts = AtomicU32::new(0);
        let err = executor(true, 2, 5)
            .execute(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<HttpResponse, _>(Error::network("always down"))
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(err.attempts(), Some(2));
        assert!(matches!(err.root_cause(), Error::Network(_)));
    }

    #[tokio::test]
    async fn test_disabled_retry_makes_one_attempt() {
        let attempts = AtomicU32::new(0);
        let err = executor(false, 10, 5)
            .execute(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<HttpResponse, _>(Error::timeout("slow"))
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(err.attempts(), Some(1));
    }

    #[tokio::test]
    async fn test_zero_max_retries_still_attempts_once() {
        let attempts = AtomicU32::new(0);
        let err = executor(true, 0, 5)
            .execute(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<HttpResponse, _>(Error::network("down"))
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(err.attempts(), Some(1));
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let attempts = AtomicU32::new(0);
        let err = executor(true, 5, 5)
            .execute(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<HttpResponse, _>(Error::invalid_request("empty url"))
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_cancellation_during_delay() {
        let token = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            })
        };

        // Long delay so cancellation lands while waiting to retry.
        let err = executor(true, 5, 10_000)
            .execute(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<HttpResponse, _>(Error::network("down"))
                },
                &token,
            )
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert!(err.is_cancelled());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_during_flight() {
        let token = CancellationToken::new();
        token.cancel();

        let err = executor(true, 3, 10)
            .execute(
                || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(ok_response())
                },
                &token,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_never_reports_exhaustion() {
        let token = CancellationToken::new();
        token.cancel();

        let err = executor(true, 2, 5)
            .execute(
                || async { Err::<HttpResponse, _>(Error::network("down")) },
                &token,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(err.attempts().is_none());
    }
}
