//! Bounded retry for failed request attempts.
//!
//! When an attempt fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Retryable`] - transport and status failures that may succeed on a re-run
//! - [`FailureType::Permanent`] - failures that a re-run cannot fix
//! - [`FailureType::Cancelled`] - the call was aborted; never retried
//!
//! The [`RetryPolicy`] then decides whether another attempt is made. Unlike a
//! backoff schedule, the delay is fixed and defaults to zero: a failed attempt
//! is re-invoked immediately.
//!
//! # Example
//!
//! ```
//! use fetcher_core::request::{RequestError, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(2);
//! let error = RequestError::http_status("https://example.com/api", 503);
//!
//! match policy.should_retry(&error, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::RequestError;
use super::constants::{DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY};

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Failure that may succeed on another attempt.
    ///
    /// Examples: network errors, connect timeouts, any non-success status.
    Retryable,

    /// Failure that won't change on another attempt.
    ///
    /// Examples: malformed URL, missing template parameter, undecodable body.
    Permanent,

    /// The attempt was aborted through its cancellation handle.
    Cancelled,
}

/// Decision on whether to make another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Retry configuration: how many extra attempts, and the pause between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    max_retries: u32,

    /// Pause before each retry.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_COUNT,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with `max_retries` immediate retries.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the configured retry count.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the total number of attempts allowed (first attempt included).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns the pause between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed with `error`.
    #[instrument(level = "debug", skip(self, error), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, error: &RequestError, attempt: u32) -> RetryDecision {
        match classify_error(error) {
            FailureType::Cancelled => {
                return RetryDecision::DoNotRetry {
                    reason: "request was cancelled".to_string(),
                };
            }
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure - retry would not help".to_string(),
                };
            }
            FailureType::Retryable => {}
        }

        if attempt >= self.max_attempts() {
            debug!(attempt, max = self.max_attempts(), "retries exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = self.delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a request error for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Cancelled | Cancelled |
/// | InvalidUrl, MissingParam, InvalidHeader | Permanent |
/// | Decode | Permanent |
/// | Network, Timeout | Retryable |
/// | HttpStatus (any) | Retryable |
#[must_use]
pub fn classify_error(error: &RequestError) -> FailureType {
    match error {
        RequestError::Cancelled { .. } => FailureType::Cancelled,
        RequestError::InvalidUrl { .. }
        | RequestError::MissingParam { .. }
        | RequestError::InvalidHeader { .. }
        | RequestError::Decode { .. } => FailureType::Permanent,
        RequestError::Network { .. }
        | RequestError::Timeout { .. }
        | RequestError::HttpStatus { .. } => FailureType::Retryable,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay(), Duration::ZERO);
    }

    #[test]
    fn test_retry_policy_with_delay() {
        let policy = RetryPolicy::new(3).with_delay(Duration::from_millis(250));
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_max_attempts_saturates() {
        assert_eq!(RetryPolicy::new(u32::MAX).max_attempts(), u32::MAX);
    }

    #[test]
    fn test_classify_status_errors_retryable() {
        for status in [400, 404, 429, 500, 503] {
            let error = RequestError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Retryable, "{status}");
        }
    }

    #[test]
    fn test_classify_timeout_retryable() {
        let error = RequestError::timeout("http://example.com");
        assert_eq!(classify_error(&error), FailureType::Retryable);
    }

    #[test]
    fn test_classify_template_errors_permanent() {
        assert_eq!(
            classify_error(&RequestError::invalid_url("::")),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&RequestError::missing_param("id", "/u/{id}")),
            FailureType::Permanent
        );
    }

    #[test]
    fn test_classify_decode_permanent() {
        let source = serde_json::from_str::<u8>("{").unwrap_err();
        let error = RequestError::decode("http://example.com", source);
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_should_retry_cancelled_does_not_retry() {
        let policy = RetryPolicy::new(5);
        let error = RequestError::cancelled("http://example.com", "test");
        let decision = policy.should_retry(&error, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("cancelled"));
        }
    }

    #[test]
    fn test_should_retry_zero_retries_never_retries() {
        let policy = RetryPolicy::default();
        let error = RequestError::http_status("http://example.com", 500);
        let decision = policy.should_retry(&error, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    #[test]
    fn test_should_retry_respects_max_retries() {
        let policy = RetryPolicy::new(2);
        let error = RequestError::http_status("http://example.com", 502);

        assert_eq!(
            policy.should_retry(&error, 1),
            RetryDecision::Retry {
                delay: Duration::ZERO,
                attempt: 2
            }
        );
        assert!(matches!(
            policy.should_retry(&error, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));

        let decision = policy.should_retry(&error, 3);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("exhausted"));
        }
    }
}
