//! Retry logic for failed API operations with exponential backoff.
//!
//! Provides configurable retry strategies:
//! - Exponential backoff with jitter
//! - Max retry limits
//! - Server-provided delay hints (Retry-After) override the computed delay

use crate::core::metrics;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Retry-related errors.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retries exhausted
    #[error("Max retries ({max_retries}) exhausted")]
    MaxRetriesExhausted { max_retries: u32, last_error: E },
}

/// Retry strategy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Disables jitter.
    #[must_use]
    pub fn no_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Calculates delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.add_jitter {
            // Up to 25% jitter
            let jitter = rand::random::<f64>() * 0.25 * capped_delay;
            capped_delay + jitter
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// Predefined retry configs for different scenarios.
impl RetryConfig {
    /// Config for network errors (more retries, longer delays).
    pub fn network() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(120),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Config for rate limiting. The 429 penalty sleep dominates the
    /// delay via the `retry_after` hint, so the base delays barely matter.
    pub fn rate_limit() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(90),
            backoff_multiplier: 1.5,
            add_jitter: false,
        }
    }

    /// Config for quick retries (e.g., temporary failures).
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

/// Result of a retry attempt.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error)
    pub result: Result<T, RetryError<E>>,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent retrying
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Returns true if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns true if all retries were exhausted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.result, Err(RetryError::MaxRetriesExhausted { .. }))
    }

    /// Extracts the success value, or the last error.
    pub fn into_result(self) -> Result<T, E> {
        self.result.map_err(|e| match e {
            RetryError::MaxRetriesExhausted { last_error, .. } => last_error,
        })
    }
}

/// Determines if an error is retryable.
pub trait Retryable {
    /// Returns true if the error should be retried.
    fn is_retryable(&self) -> bool;

    /// Returns an optional hint for retry delay (e.g., from rate limit headers).
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Executes an async operation with retry logic.
///
/// # Arguments
/// * `config` - Retry configuration
/// * `operation` - The async operation to execute
///
/// # Returns
/// A `RetryResult` containing either the successful result or the last error.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Debug,
{
    let start = std::time::Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
            Err(e) if attempts <= config.max_retries && e.is_retryable() => {
                metrics::API_RETRIES_TOTAL
                    .with_label_values(&[&attempts.to_string()])
                    .inc();

                // Respect the retry_after hint if provided
                let delay = e
                    .retry_after()
                    .unwrap_or_else(|| config.delay_for_attempt(attempts - 1));

                log::warn!(
                    "Attempt {}/{} failed (retrying in {:?}): {:?}",
                    attempts,
                    config.max_retries + 1,
                    delay,
                    e
                );

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return RetryResult {
                    result: Err(RetryError::MaxRetriesExhausted {
                        max_retries: config.max_retries,
                        last_error: e,
                    }),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
        }
    }
}
