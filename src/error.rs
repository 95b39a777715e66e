//! Error types for iNaturalist API calls.
//!
//! Every per-call failure is returned as an [`Error`] value. The variants keep
//! the raw response body and status around so a failed call can be debugged
//! without re-issuing it, and [`Error::is_retryable`] tells transient failures
//! apart from permanent ones.

use crate::rate_limit::RateLimitInfo;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;

/// The main error type for iNaturalist API calls.
///
/// # Examples
///
/// ```no_run
/// use naturalist::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().build()?;
///
/// match client.get_observation(42).await {
///     Ok(observation) => println!("Observed at {:?}", observation.latitude),
///     Err(Error::HttpError { status, .. }) if status.as_u16() == 404 => {
///         eprintln!("No such observation");
///     }
///     Err(e) if e.is_retryable() => eprintln!("Try again later: {}", e),
///     Err(e) => eprintln!("Permanent failure: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS failure, TLS, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The response body did not match the expected JSON shape.
    ///
    /// The raw body is preserved so the mismatch can be inspected.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server answered with a status the call does not accept.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
        /// The provider's error payload, when the body could be decoded as one
        provider_error: Option<ProviderError>,
        /// Rate limit information parsed from headers
        rate_limit_info: Option<RateLimitInfo>,
    },

    /// The OAuth2 authorization-code exchange failed.
    #[error("Token exchange failed: {message}")]
    AuthExchange {
        /// The token endpoint's status, if a response was received at all
        status: Option<StatusCode>,
        /// What went wrong
        message: String,
    },

    /// Invalid static configuration, such as a bad header value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The retry strategy ran out of attempts while the server kept
    /// answering with a retryable status.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The error produced by the final attempt
        last_error: Box<Error>,
    },

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// A configured URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Error payload returned by the provider alongside a failing status.
///
/// The API answers with either `{"error": "..."}` or
/// `{"errors": [...]}` (sometimes an object keyed by field name).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderError {
    /// Single error message.
    #[serde(default)]
    pub error: Option<String>,
    /// Validation errors, kept as raw JSON because their shape varies.
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

impl ProviderError {
    /// Attempts to decode a provider error from a response body.
    ///
    /// Returns `None` when the body is not JSON or carries neither field.
    pub fn from_body(body: &str) -> Option<Self> {
        let parsed: ProviderError = serde_json::from_str(body).ok()?;
        if parsed.error.is_none() && parsed.errors.is_none() {
            return None;
        }
        Some(parsed)
    }

    /// Flattens the payload into human-readable messages.
    ///
    /// ```
    /// use naturalist::ProviderError;
    ///
    /// let err = ProviderError::from_body(r#"{"errors":["Body can't be blank"]}"#).unwrap();
    /// assert_eq!(err.messages(), vec!["Body can't be blank".to_string()]);
    /// ```
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if let Some(error) = &self.error {
            messages.push(error.clone());
        }
        match &self.errors {
            Some(serde_json::Value::Array(items)) => {
                messages.extend(items.iter().map(value_to_message));
            }
            Some(serde_json::Value::Object(fields)) => {
                for (field, value) in fields {
                    match value {
                        serde_json::Value::Array(items) => messages.extend(
                            items
                                .iter()
                                .map(|item| format!("{} {}", field, value_to_message(item))),
                        ),
                        other => messages.push(format!("{} {}", field, value_to_message(other))),
                    }
                }
            }
            Some(other) => messages.push(value_to_message(other)),
            None => {}
        }
        messages
    }
}

fn value_to_message(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Error {
    /// Returns `true` if re-invoking the call later may succeed.
    ///
    /// Network errors, timeouts, 429 and 5xx responses are transient, as is
    /// running out of retries on one of those. 4xx responses, decode failures
    /// and configuration problems are permanent.
    ///
    /// # Examples
    ///
    /// ```
    /// use naturalist::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::TOO_MANY_REQUESTS,
    ///     raw_response: String::new(),
    ///     headers: http::HeaderMap::new(),
    ///     provider_error: None,
    ///     rate_limit_info: None,
    /// };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::UNPROCESSABLE_ENTITY,
    ///     raw_response: String::new(),
    ///     headers: http::HeaderMap::new(),
    ///     provider_error: None,
    ///     rate_limit_info: None,
    /// };
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout => true,
            Error::HttpError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Error::MaxRetriesExceeded { last_error, .. } => last_error.is_retryable(),
            Error::DeserializationFailed { .. } => false,
            Error::AuthExchange { .. } => false,
            Error::ConfigurationError(_) => false,
            Error::SerializationFailed(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::AuthExchange { status, .. } => *status,
            Error::MaxRetriesExceeded { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.raw_response(),
            _ => None,
        }
    }

    /// Returns the decoded provider error payload, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Error::HttpError { provider_error, .. } => provider_error.as_ref(),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.provider_error(),
            _ => None,
        }
    }

    /// Returns rate limit information if available.
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            Error::HttpError {
                rate_limit_info, ..
            } => rate_limit_info.as_ref(),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.rate_limit_info(),
            _ => None,
        }
    }

    /// Maps a transport error, keeping timeouts distinguishable.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(error)
        }
    }
}

/// A specialized `Result` type for iNaturalist API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: StatusCode, body: &str) -> Error {
        Error::HttpError {
            status,
            raw_response: body.to_string(),
            headers: HeaderMap::new(),
            provider_error: ProviderError::from_body(body),
            rate_limit_info: None,
        }
    }

    #[test]
    fn test_provider_error_single_message() {
        let err = ProviderError::from_body(r#"{"error":"not authorized"}"#).unwrap();
        assert_eq!(err.error.as_deref(), Some("not authorized"));
        assert_eq!(err.messages(), vec!["not authorized".to_string()]);
    }

    #[test]
    fn test_provider_error_field_map() {
        let err = ProviderError::from_body(r#"{"errors":{"body":["can't be blank"]}}"#).unwrap();
        assert_eq!(err.messages(), vec!["body can't be blank".to_string()]);
    }

    #[test]
    fn test_provider_error_not_json() {
        assert!(ProviderError::from_body("<html>oops</html>").is_none());
        assert!(ProviderError::from_body(r#"{"id":1}"#).is_none());
    }

    #[test]
    fn test_max_retries_delegates_to_last_error() {
        let err = Error::MaxRetriesExceeded {
            attempts: 4,
            last_error: Box::new(http_error(StatusCode::TOO_MANY_REQUESTS, "slow down")),
        };
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(err.raw_response(), Some("slow down"));

        let err = Error::MaxRetriesExceeded {
            attempts: 4,
            last_error: Box::new(http_error(StatusCode::ACCEPTED, "")),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!http_error(StatusCode::NOT_FOUND, "").is_retryable());
        assert!(!Error::ConfigurationError("bad".to_string()).is_retryable());
        assert!(!Error::AuthExchange {
            status: Some(StatusCode::UNAUTHORIZED),
            message: "invalid_grant".to_string(),
        }
        .is_retryable());
        assert!(Error::Timeout.is_retryable());
    }
}
