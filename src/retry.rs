//! Unbounded exponential backoff retry for tracker calls.
//!
//! The full issue reload must eventually succeed once the tracker recovers, so
//! transient failures are retried without an attempt limit:
//!
//! - Default delays: 1s, 2s, 4s, ... capped at 60s
//! - Fatal failures are returned immediately
//! - A `CancellationToken` is the only way to bound the loop; it interrupts any
//!   in-flight wait
//!
//! Every failed attempt, transient or fatal, is reported to the caller's
//! `on_failed_attempt` callback before the loop decides what to do next.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::tracker::ErrorKind;

/// Configuration for capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential growth).
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (typically 2.0).
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Default configuration for the full issue reload.
    ///
    /// - 1s initial delay, doubling each attempt
    /// - Capped at 60s from the seventh retry on
    pub const DEFAULT: Self = Self {
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(60),
        backoff_multiplier: 2.0,
    };

    /// Creates a new retry configuration.
    pub fn new(initial_delay: Duration, max_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Computes the delay for the given retry attempt (0-indexed).
    ///
    /// The delay grows exponentially: `initial_delay * backoff_multiplier^attempt`,
    /// capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.backoff_multiplier.powi(exponent);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        if !delay_secs.is_finite() || delay_secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(delay_secs)
    }

    /// Returns the (unbounded) sequence of retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A failed attempt, as reported to the `on_failed_attempt` callback.
#[derive(Debug)]
pub struct FailedAttempt<'a, E> {
    /// 1-based attempt number.
    pub attempt: u32,

    /// The error returned by this attempt.
    pub error: &'a E,

    /// How the error was classified.
    pub kind: ErrorKind,

    /// The wait before the next attempt, or `None` if the loop stops here.
    pub next_delay: Option<Duration>,
}

/// Result of a retry loop.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// The operation succeeded.
    Success(T),

    /// A fatal error occurred (not retriable).
    Fatal {
        error: E,
        /// Number of attempts made, including the fatal one.
        attempts: u32,
    },

    /// The cancellation token fired before the operation succeeded.
    Cancelled {
        /// The last transient error seen, if any attempt was made.
        last_error: Option<E>,
        attempts: u32,
    },
}

impl<T, E> RetryResult<T, E> {
    /// Returns true if the result is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }
}

/// Executes an async operation, retrying transient failures until it succeeds.
///
/// # Arguments
///
/// * `config` - Backoff delays
/// * `cancel` - Stops the loop; checked before each attempt and raced against each wait
/// * `classify` - Maps an error to transient or fatal
/// * `on_failed_attempt` - Observability hook, called once per failed attempt
/// * `operation` - The async operation to execute. Called repeatedly until
///   success, a fatal error, or cancellation.
pub async fn retry_with_backoff<T, E, F, Fut, C, R>(
    config: RetryConfig,
    cancel: &CancellationToken,
    classify: C,
    mut on_failed_attempt: R,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> ErrorKind,
    R: FnMut(&FailedAttempt<'_, E>),
{
    let mut attempt = 0;
    let mut last_error = None;

    loop {
        if cancel.is_cancelled() {
            return RetryResult::Cancelled {
                last_error,
                attempts: attempt,
            };
        }

        let error = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => e,
        };
        attempt += 1;

        let kind = classify(&error);
        let next_delay = match kind {
            ErrorKind::Transient => Some(config.delay_for_attempt(attempt - 1)),
            ErrorKind::Fatal => None,
        };

        on_failed_attempt(&FailedAttempt {
            attempt,
            error: &error,
            kind,
            next_delay,
        });

        let Some(delay) = next_delay else {
            return RetryResult::Fatal {
                error,
                attempts: attempt,
            };
        };
        last_error = Some(error);

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(attempt, "Retry wait cancelled");
                return RetryResult::Cancelled {
                    last_error,
                    attempts: attempt,
                };
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
