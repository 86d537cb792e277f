//! Bounded exponential-backoff retries for network operations.
//!
//! The executor only sleeps the task that called it, so a request handler
//! waiting out a backoff never stalls unrelated work on the runtime.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Classifies failures the executor may retry.
///
/// Only transient network-layer failures should answer `true`. Decode and
/// validation failures are deterministic and are surfaced on first sight.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Retry policy for a fallible operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep before the second attempt.
    pub initial_delay: Duration,
    /// Double the delay after every failed attempt.
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 4, initial_delay: Duration::from_secs(2), exponential: true }
    }
}

impl RetryPolicy {
    /// Policy that runs the operation exactly once.
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, initial_delay: Duration::ZERO, exponential: false }
    }

    /// Delay slept after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if !self.exponential || attempt <= 1 {
            return self.initial_delay;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Run `op` under `policy`, retrying retryable failures.
///
/// On exhaustion the last failure is returned unchanged.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_retryable() => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn policy(max_attempts: u32, secs: f64, exponential: bool) -> RetryPolicy {
        RetryPolicy { max_attempts, initial_delay: Duration::from_secs_f64(secs), exponential }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_fourth_attempt_with_doubling_delays() {
        let calls = Arc::new(AtomicU32::new(0));
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let start = Instant::now();

        let result = retry(&policy(4, 1.0, true), || {
            let calls = Arc::clone(&calls);
            let stamps = Arc::clone(&stamps);
            async move {
                stamps.lock().unwrap().push(Instant::now());
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 4 { Err(TestError::Transient) } else { Ok(n) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let stamps = stamps.lock().unwrap();
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        let expected = [1.0, 2.0, 4.0];
        for (gap, want) in gaps.iter().zip(expected) {
            let secs = gap.as_secs_f64();
            assert!(secs >= want && secs < want + 0.5, "gap {secs} expected ~{want}");
        }
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), TestError> = retry(&policy(3, 0.5, false), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();
        let result: Result<(), TestError> = retry(&RetryPolicy::default(), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_delay_schedule() {
        let exp = policy(4, 2.0, true);
        assert_eq!(exp.delay_after(1), Duration::from_secs(2));
        assert_eq!(exp.delay_after(2), Duration::from_secs(4));
        assert_eq!(exp.delay_after(3), Duration::from_secs(8));

        let flat = policy(4, 2.0, false);
        assert_eq!(flat.delay_after(3), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let p = RetryPolicy { max_attempts: 0, ..RetryPolicy::no_retry() };
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let calls = AtomicU32::new(0);
        let result: Result<u32, TestError> = rt.block_on(retry(&p, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(1) }
        }));
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
