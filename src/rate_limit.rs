//! Rate limit header parsing.
//!
//! When the API throttles a client it may say how long to back off. The
//! pipeline never waits less than the retry strategy's delay, but it will
//! wait longer when the server asks for it, up to [`RateLimitConfig::max_wait`].

use http::HeaderMap;
use std::time::{Duration, SystemTime};

/// Rate limit details extracted from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// How long the server asked us to wait (`Retry-After`).
    pub retry_after: Option<Duration>,

    /// Requests left in the current window (`X-RateLimit-Remaining`).
    pub remaining: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from response headers.
    ///
    /// `Retry-After` may be either delay-seconds or an HTTP date.
    ///
    /// # Examples
    ///
    /// ```
    /// use naturalist::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    /// use std::time::Duration;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "60".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers).unwrap();
    /// assert_eq!(info.retry_after, Some(Duration::from_secs(60)));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let info = Self {
            retry_after: parse_retry_after(headers),
            remaining: parse_remaining(headers),
        };
        (info.retry_after.is_some() || info.remaining.is_some()).then_some(info)
    }

    /// Returns the server-requested delay capped by `max_wait`.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        self.retry_after.map(|d| d.min(max_wait))
    }

    /// Returns `true` if the server reported an exhausted window.
    pub fn is_exhausted(&self) -> bool {
        self.retry_after.is_some() || self.remaining == Some(0)
    }
}

/// Configuration for honoring rate limit headers.
///
/// # Examples
///
/// ```
/// use naturalist::rate_limit::RateLimitConfig;
/// use std::time::Duration;
///
/// let config = RateLimitConfig::builder()
///     .max_wait(Duration::from_secs(120))
///     .build();
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether `Retry-After` may lengthen the retry delay.
    pub enabled: bool,

    /// Upper bound on a server-requested wait. Defaults to 5 minutes.
    pub max_wait: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_wait: Duration::from_secs(300),
        }
    }
}

impl RateLimitConfig {
    /// Creates a new builder.
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }

    /// A configuration that ignores rate limit headers.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Chooses the wait before the next attempt.
    ///
    /// The strategy's delay is a floor; a longer `Retry-After` wins, capped
    /// by `max_wait`.
    pub fn effective_delay(&self, strategy_delay: Duration, info: Option<&RateLimitInfo>) -> Duration {
        if !self.enabled {
            return strategy_delay;
        }
        match info.and_then(|info| info.delay(self.max_wait)) {
            Some(requested) => requested.max(strategy_delay),
            None => strategy_delay,
        }
    }
}

/// Builder for [`RateLimitConfig`].
#[derive(Default)]
pub struct RateLimitConfigBuilder {
    enabled: Option<bool>,
    max_wait: Option<Duration>,
}

impl RateLimitConfigBuilder {
    /// Sets whether rate limit headers are honored.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the cap on server-requested waits.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Builds the `RateLimitConfig`.
    pub fn build(self) -> RateLimitConfig {
        let default = RateLimitConfig::default();
        RateLimitConfig {
            enabled: self.enabled.unwrap_or(default.enabled),
            max_wait: self.max_wait.unwrap_or(default.max_wait),
        }
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?;

    if let Ok(seconds) = header.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // HTTP-date form; a date in the past means "now".
    let date = httpdate::parse_http_date(header).ok()?;
    Some(
        date.duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

fn parse_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("x-ratelimit-remaining")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_no_headers_means_no_info() {
        assert!(RateLimitInfo::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        let when = SystemTime::now() + Duration::from_secs(30);
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&httpdate::fmt_http_date(when)).unwrap(),
        );

        let info = RateLimitInfo::from_headers(&headers).unwrap();
        let wait = info.retry_after.unwrap();
        assert!(wait <= Duration::from_secs(30));
        assert!(wait >= Duration::from_secs(28), "got {:?}", wait);
    }

    #[test]
    fn test_retry_after_in_the_past_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );

        let info = RateLimitInfo::from_headers(&headers).unwrap();
        assert_eq!(info.retry_after, Some(Duration::ZERO));
    }

    #[test]
    fn test_remaining_only() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));

        let info = RateLimitInfo::from_headers(&headers).unwrap();
        assert_eq!(info.remaining, Some(0));
        assert!(info.is_exhausted());
        assert_eq!(info.delay(Duration::from_secs(10)), None);
    }

    #[test]
    fn test_effective_delay_never_shorter_than_strategy() {
        let config = RateLimitConfig::default();
        let short = RateLimitInfo {
            retry_after: Some(Duration::from_millis(10)),
            remaining: None,
        };
        assert_eq!(
            config.effective_delay(Duration::from_secs(1), Some(&short)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_effective_delay_capped_by_max_wait() {
        let config = RateLimitConfig::builder()
            .max_wait(Duration::from_secs(5))
            .build();
        let long = RateLimitInfo {
            retry_after: Some(Duration::from_secs(600)),
            remaining: Some(0),
        };
        assert_eq!(
            config.effective_delay(Duration::from_secs(1), Some(&long)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_disabled_ignores_headers() {
        let config = RateLimitConfig::disabled();
        let long = RateLimitInfo {
            retry_after: Some(Duration::from_secs(600)),
            remaining: None,
        };
        assert_eq!(
            config.effective_delay(Duration::from_millis(50), Some(&long)),
            Duration::from_millis(50)
        );
    }
}
