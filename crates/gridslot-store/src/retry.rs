//! Retry logic for lookups that may race a very recent write.

use std::future::Future;
use std::time::Duration;

use crate::{Result, TRACING_TARGET_RETRY};

/// Configuration for retry behavior on failed operations.
///
/// `max_attempts` counts retries, so an operation runs at most
/// `max_attempts + 1` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means no retries)
    pub max_attempts: u32,
    /// Delay between two attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::lookup()
    }
}

impl RetryConfig {
    /// Create a configuration with a fixed delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Read-after-write lookup policy: four attempts in total, 500 ms apart.
    ///
    /// This masks eventual consistency in the backing store; it is not a
    /// correctness guarantee.
    pub fn lookup() -> Self {
        Self::fixed(3, Duration::from_millis(500))
    }

    /// Retry an async operation while `should_retry` accepts its error.
    ///
    /// The last error is returned once the predicate rejects an error or
    /// all attempts are used up.
    pub async fn retry_if<F, Fut, T, E, P>(&self, mut operation: F, mut should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !should_retry(&err) || attempt >= self.max_attempts {
                return Err(err);
            }

            attempt += 1;
            tracing::debug!(
                target: TRACING_TARGET_RETRY,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = self.delay.as_millis(),
                "Retrying operation after delay"
            );
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::Error;

    fn counted(calls: &Arc<AtomicU32>, succeed_on: u32) -> impl Future<Output = Result<u32>> {
        let calls = calls.clone();
        async move {
            let current = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if current < succeed_on {
                Err(Error::not_found("fs", "x"))
            } else {
                Ok(42)
            }
        }
    }

    #[test]
    fn lookup_policy_is_fixed() {
        let config = RetryConfig::lookup();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay, Duration::from_millis(500));
        assert_eq!(RetryConfig::default(), config);
    }

    #[tokio::test]
    async fn retry_until_success() {
        let config = RetryConfig::fixed(3, Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));

        let result = config
            .retry_if(|| counted(&calls, 3), Error::is_not_found)
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_all_attempts() {
        let config = RetryConfig::fixed(3, Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));

        let result = config
            .retry_if(|| counted(&calls, u32::MAX), Error::is_not_found)
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn rejected_error_fails_immediately() {
        let config = RetryConfig::fixed(3, Duration::ZERO);
        let calls = Arc::new(AtomicU32::new(0));

        let result = config
            .retry_if(|| counted(&calls, u32::MAX), Error::is_retryable)
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
