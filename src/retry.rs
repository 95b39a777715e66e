//! Retry strategies and predicates for statuses the API uses to say "not yet".
//!
//! The API answers `429 Too Many Requests` when a client is throttled and
//! `202 Accepted` when a write has been queued but not applied. Neither is a
//! failure, so the pipeline can wait and resend the identical request. How
//! long to wait and how many times is a [`RetryStrategy`]; which statuses
//! qualify is a [`RetryPredicate`].

use http::StatusCode;
use std::time::Duration;

/// Defines when and how long to wait before resending a request.
///
/// # Examples
///
/// ```
/// use naturalist::RetryStrategy;
/// use std::time::Duration;
///
/// // No retries: a 429 is reported straight away.
/// let no_retry = RetryStrategy::None;
///
/// // Wait 2s between attempts, give up after 5 retries.
/// let fixed = RetryStrategy::Fixed {
///     delay: Duration::from_secs(2),
///     max_retries: 5,
/// };
/// assert_eq!(fixed.delay_for_attempt(5), Some(Duration::from_secs(2)));
/// assert_eq!(fixed.delay_for_attempt(6), None);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry.
    #[default]
    None,

    /// Retry with the same delay between every attempt.
    Fixed {
        /// The delay between attempts.
        delay: Duration,
        /// The maximum number of retries after the first attempt.
        max_retries: usize,
    },

    /// Custom retry schedule.
    Custom {
        /// Takes the retry number (1-indexed) and returns the delay before
        /// it, or `None` to stop retrying.
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// Returns the delay before the given retry, or `None` if retries are exhausted.
    ///
    /// `attempt` is 1-indexed: 1 is the first retry.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::Fixed { delay, max_retries } => {
                if attempt > *max_retries {
                    None
                } else {
                    Some(*delay)
                }
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// Returns the maximum number of retries, if known up front.
    pub fn max_retries(&self) -> Option<usize> {
        match self {
            RetryStrategy::None => Some(0),
            RetryStrategy::Fixed { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }

    /// Returns `true` unless this is [`RetryStrategy::None`].
    pub fn is_enabled(&self) -> bool {
        !matches!(self, RetryStrategy::None)
    }
}

/// Decides whether a response status warrants resending the request.
///
/// # Examples
///
/// ```
/// use naturalist::RetryPredicate;
/// use http::StatusCode;
///
/// struct RetryOnUnavailable;
///
/// impl RetryPredicate for RetryOnUnavailable {
///     fn should_retry(&self, status: StatusCode, _attempt: usize) -> bool {
///         status == StatusCode::SERVICE_UNAVAILABLE
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if a response with `status` on `attempt` (1-indexed)
    /// should be retried.
    fn should_retry(&self, status: StatusCode, attempt: usize) -> bool;
}

/// Retry on `429 Too Many Requests`.
///
/// The default for listing (GET) calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRateLimited;

impl RetryPredicate for RetryOnRateLimited {
    fn should_retry(&self, status: StatusCode, _attempt: usize) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// Retry on `202 Accepted`.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnAccepted;

impl RetryPredicate for RetryOnAccepted {
    fn should_retry(&self, status: StatusCode, _attempt: usize) -> bool {
        status == StatusCode::ACCEPTED
    }
}

/// Retry on any of a fixed set of statuses.
#[derive(Debug, Clone)]
pub struct RetryOnStatus(pub Vec<StatusCode>);

impl RetryPredicate for RetryOnStatus {
    fn should_retry(&self, status: StatusCode, _attempt: usize) -> bool {
        self.0.contains(&status)
    }
}

/// Combine multiple retry predicates with OR logic.
///
/// # Examples
///
/// ```
/// use naturalist::retry::{OrPredicate, RetryOnAccepted, RetryOnRateLimited};
/// use naturalist::RetryPredicate;
/// use http::StatusCode;
///
/// let predicate = OrPredicate::new(vec![
///     Box::new(RetryOnAccepted),
///     Box::new(RetryOnRateLimited),
/// ]);
/// assert!(predicate.should_retry(StatusCode::ACCEPTED, 1));
/// assert!(!predicate.should_retry(StatusCode::CREATED, 1));
/// ```
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, status: StatusCode, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(status, attempt))
    }
}

/// Combine multiple retry predicates with AND logic.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates a new `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, status: StatusCode, attempt: usize) -> bool {
        self.predicates
            .iter()
            .all(|p| p.should_retry(status, attempt))
    }
}

/// The predicate mutating calls use unless configured otherwise: 202 or 429.
pub fn default_mutation_predicate() -> Box<dyn RetryPredicate> {
    Box::new(OrPredicate::new(vec![
        Box::new(RetryOnAccepted),
        Box::new(RetryOnRateLimited),
    ]))
}

/// The predicate listing calls use unless configured otherwise: 429 only.
pub fn default_listing_predicate() -> Box<dyn RetryPredicate> {
    Box::new(RetryOnRateLimited)
}
