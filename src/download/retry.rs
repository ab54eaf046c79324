//! Retry logic with exponential backoff and full jitter for page fetches.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying fetch errors and determining retry behavior.
//!
//! # Overview
//!
//! When a fetch fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - HTTP error responses, retried with backoff
//! - [`FailureType::Permanent`] - everything else, the page fails immediately
//!
//! The [`RetryPolicy`] then determines whether to retry based on failure type
//! and attempt count. The ceiling is an attempt count, not a time budget.
//!
//! # Example
//!
//! ```
//! use cookbooker_core::download::{
//!     FetchError, RetryPolicy, RetryDecision, classify_error
//! };
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://example.com/page", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::FetchError;
use super::constants::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};

/// Largest exponent used for the jitter window; keeps `2^i` inside `u64`.
const MAX_BACKOFF_EXPONENT: u32 = 62;

/// Classification of fetch failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The server answered with an error status; may succeed on retry.
    Transient,

    /// Won't be retried: malformed URL, connection or DNS failure, timeout.
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the fetch after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the fetch.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 10
/// - `unit`: 1 second
///
/// # Delay Calculation
///
/// After the attempt with 0-based index `i` fails, the delay is
///
/// ```text
/// delay = unit * k,  k drawn uniformly from [0, 2^i - 1)
/// ```
///
/// and zero when that range is empty (the first two retries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Time unit multiplied by the drawn jitter factor.
    unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    /// Creates a policy with a custom max_attempts, using the default unit.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, DEFAULT_BACKOFF_UNIT)
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff time unit.
    #[must_use]
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Determines whether to retry a failed fetch.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.backoff_delay(attempt.saturating_sub(1));

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Exclusive upper bound of the jitter factor after failed attempt `index` (0-based).
    #[must_use]
    pub fn jitter_ceiling(index: u32) -> u64 {
        (1u64 << index.min(MAX_BACKOFF_EXPONENT)) - 1
    }

    /// Draws the sleep before retrying after failed attempt `index` (0-based).
    #[must_use]
    pub fn backoff_delay(&self, index: u32) -> Duration {
        let ceiling = Self::jitter_ceiling(index);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        let factor = rand::thread_rng().gen_range(0..ceiling);
        self.unit
            .saturating_mul(u32::try_from(factor).unwrap_or(u32::MAX))
    }
}

/// Classifies a fetch error into a failure type for retry decisions.
///
/// Only error responses from the server are retried. Requests that never
/// produced a response (bad URL, refused connection, DNS failure, timeout)
/// fail the page on the first attempt.
#[instrument]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::HttpStatus { .. } => FailureType::Transient,
        FetchError::Network { .. } | FetchError::Timeout { .. } | FetchError::InvalidUrl { .. } => {
            FailureType::Permanent
        }
    }
}
