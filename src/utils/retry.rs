use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Bounded Retry with Linear Backoff
// ============================================================================
//
// Drives the optimistic compare-and-swap loops of the order aggregate.
// A lost race is transient: the attempt is repeated after waiting
// `backoff_step * attempt`. A business rule rejection is permanent and is
// handed back without another attempt.
//
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Backoff unit; the wait after attempt `n` is `backoff_step * n`
    pub backoff_step: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(10),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Result of a retry operation
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// Operation succeeded
    Success(T),
    /// Operation failed after all retries
    Failed(E),
    /// Operation permanently failed (should not retry)
    PermanentFailure(E),
}

/// Check if an error is transient (should retry) or permanent (should not retry)
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

/// Failure of a single compare-and-swap attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CasError<E> {
    /// Another writer published first; the observed value is stale
    LostRace,
    /// The observed value does not admit the update
    Rejected(E),
}

impl<E> IsTransient for CasError<E> {
    fn is_transient(&self) -> bool {
        matches!(self, CasError::LostRace)
    }
}

impl<E: fmt::Display> fmt::Display for CasError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CasError::LostRace => write!(f, "lost compare-and-swap race"),
            CasError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

/// Raised when every attempt of a compare-and-swap loop lost its race
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{operation} gave up after {attempts} attempts under contention")]
pub struct RetriesExhausted {
    pub operation: &'static str,
    pub attempts: u32,
}

/// Retry with transient error checking
pub async fn retry_on_transient<F, T, E>(
    config: &RetryConfig,
    operation_name: &'static str,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    E: fmt::Display + IsTransient,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        tracing::debug!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = max_attempts,
            "Attempting operation"
        );

        match operation(attempt) {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return RetryResult::Success(result);
            }
            Err(error) => {
                if !error.is_transient() {
                    tracing::debug!(
                        operation = operation_name,
                        error = %error,
                        "Permanent failure detected, not retrying"
                    );
                    return RetryResult::PermanentFailure(error);
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt = attempt,
                        error = %error,
                        "Operation failed after all retries"
                    );
                    return RetryResult::Failed(error);
                }

                let delay = config.delay_for(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying after delay"
                );

                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Run a compare-and-swap loop and fold its outcome into the caller's error type.
///
/// Rejections pass through untouched; exhausting the attempt budget becomes
/// [`RetriesExhausted`].
pub async fn retry_cas<F, T, E>(
    config: &RetryConfig,
    operation_name: &'static str,
    operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, CasError<E>>,
    E: fmt::Display + From<RetriesExhausted>,
{
    match retry_on_transient(config, operation_name, operation).await {
        RetryResult::Success(value) => Ok(value),
        RetryResult::PermanentFailure(CasError::Rejected(e))
        | RetryResult::Failed(CasError::Rejected(e)) => Err(e),
        RetryResult::PermanentFailure(CasError::LostRace)
        | RetryResult::Failed(CasError::LostRace) => Err(RetriesExhausted {
            operation: operation_name,
            attempts: config.max_attempts.max(1),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Busy,
        Exhausted(u32),
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl From<RetriesExhausted> for TestError {
        fn from(e: RetriesExhausted) -> Self {
            TestError::Exhausted(e.attempts)
        }
    }

    #[test]
    fn test_default_policy_is_three_attempts_linear_ten_ms() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay_for(1), Duration::from_millis(10));
        assert_eq!(config.delay_for(2), Duration::from_millis(20));
        assert_eq!(config.delay_for(3), Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_lost_races() {
        let mut calls = 0;
        let result = retry_on_transient(&RetryConfig::default(), "test", |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(CasError::<TestError>::LostRace)
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success(3)));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_waits_linear_backoff_between_attempts() {
        let config = RetryConfig::default();
        let mut calls = 0;
        let started = Instant::now();

        let result = retry_on_transient(&config, "test", |_attempt| {
            calls += 1;
            Err::<(), _>(CasError::<TestError>::LostRace)
        })
        .await;

        assert!(matches!(result, RetryResult::Failed(CasError::LostRace)));
        assert_eq!(calls, 3);
        // 10ms after the first attempt, 20ms after the second, none after the last
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let mut calls = 0;
        let result = retry_cas(&RetryConfig::default(), "test", |_attempt| {
            calls += 1;
            Err::<(), _>(CasError::Rejected(TestError::Busy))
        })
        .await;

        assert_eq!(result, Err(TestError::Busy));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retry_cas_reports_exhausted_attempts() {
        let config = RetryConfig::new(2, Duration::ZERO);
        let result: Result<(), TestError> =
            retry_cas(&config, "test", |_attempt| Err(CasError::LostRace)).await;

        assert_eq!(result, Err(TestError::Exhausted(2)));
    }
}
