//! Backoff strategy implementation
//!
//! Exponential backoff with multiplicative jitter:
//! `delay(attempt) = min(base * 2^attempt, max) * jitter`, jitter drawn
//! uniformly from `[0.5, 1.5)`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use super::classifier::RetryClassifiable;

/// Lower bound (inclusive) of the jitter multiplier.
pub const JITTER_MIN: f64 = 0.5;

/// Upper bound (exclusive) of the jitter multiplier.
pub const JITTER_MAX: f64 = 1.5;

/// Decides whether a failed attempt may be retried.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Retry configuration, created per call site.
pub struct RetryConfig<E> {
    /// Retries after the initial attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub should_retry: RetryPredicate<E>,
    /// Emit a warning per retry
    pub log_retries: bool,
}

impl<E: RetryClassifiable + 'static> RetryConfig<E> {
    /// Config that retries whatever the error classifies as retryable.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            should_retry: Arc::new(|err: &E| err.is_retryable()),
            log_retries: true,
        }
    }
}

impl<E> RetryConfig<E> {
    /// Replace the retry predicate for this call site.
    pub fn with_should_retry<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Disable per-retry warnings.
    pub fn quiet(mut self) -> Self {
        self.log_retries = false;
        self
    }

    /// Total number of times the operation may run.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after the 0-based `attempt` failed, with fresh jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = rand::rng().random_range(JITTER_MIN..JITTER_MAX);
        backoff_delay(attempt, self.base_delay, self.max_delay, jitter)
    }
}

impl<E: RetryClassifiable + 'static> Default for RetryConfig<E> {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1_000), Duration::from_millis(10_000))
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            should_retry: Arc::clone(&self.should_retry),
            log_retries: self.log_retries,
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("log_retries", &self.log_retries)
            .finish_non_exhaustive()
    }
}

/// Capped exponential delay scaled by `jitter`.
///
/// The exponential term saturates at `max_delay` instead of overflowing.
pub fn backoff_delay(attempt: u32, base_delay: Duration, max_delay: Duration, jitter: f64) -> Duration {
    let capped = 2u32
        .checked_pow(attempt)
        .and_then(|factor| base_delay.checked_mul(factor))
        .map_or(max_delay, |delay| delay.min(max_delay));
    capped.mul_f64(jitter)
}

/// Run `operation` until it succeeds, the predicate rejects the error, or
/// `max_retries` retries have been spent.
///
/// On exhaustion the last error is returned as-is; no aggregate is built.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, config: &RetryConfig<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let total_attempts = config.total_attempts();
    let mut attempt: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= config.max_retries || !(config.should_retry)(&err) {
            return Err(err);
        }

        let delay = config.delay_for(attempt);
        if config.log_retries {
            tracing::warn!(
                attempt = attempt + 1,
                total_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, retrying"
            );
        }
        drop(err);

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
