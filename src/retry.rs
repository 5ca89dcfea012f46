use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as transient (worth another attempt) or
/// terminal (propagate immediately).
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Retry budget for one logical outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        assert!(max_attempts >= 1, "max_attempts must be at least 1");
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before retry number `retry_index` (0-based): the base
    /// delay doubled on every retry, so 1, 2, 4, ... base units.
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry_index)
    }
}

/// Run `operation` until it succeeds, fails terminally, or the attempt
/// ceiling is reached.
///
/// The operation is invoked at most `max_attempts` times. Between
/// attempts the calling task sleeps for an exponentially growing
/// delay; nothing else is blocked. The sleep only happens when another
/// attempt will actually follow, and a terminal error skips the loop
/// entirely.
pub async fn execute<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                attempts += 1;
                if attempts >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_for(attempts - 1);
                tracing::warn!(
                    "attempt {}/{} failed ({}), retrying in {:?}",
                    attempts,
                    policy.max_attempts,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient"),
                TestError::Fatal => write!(f, "fatal"),
            }
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn one_second_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn failing_operation_runs_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), TestError> = execute(&one_second_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Transient) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff between the three attempts
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_second_attempt_stops_retrying() {
        let calls = AtomicU32::new(0);

        let result = execute(&one_second_policy(3), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_fails_without_sleeping() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), TestError> = execute(&one_second_policy(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Transient) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_is_never_retried() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), TestError> = execute(&one_second_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Fatal) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn delay_doubles_on_every_retry() {
        let policy = one_second_policy(5);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    #[should_panic(expected = "max_attempts must be at least 1")]
    fn zero_max_attempts_panics() {
        RetryPolicy::new(0, Duration::from_secs(1));
    }
}
