//! Per-request description: method, path, query, headers, timeout.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::time::Duration;

/// Everything needed to issue one request, apart from the body.
///
/// Query parameters keep insertion order, so the same options always produce
/// the same URL.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The request path, relative to the client's base URL.
    pub path: String,

    /// Additional headers for this request.
    pub headers: HeaderMap,

    /// Query parameters, in the order they were added.
    pub query_params: Vec<(String, String)>,

    /// Overrides the client's default timeout for this call, retries included.
    pub timeout: Option<Duration>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            timeout: None,
        }
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Appends a query parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Appends several query parameters.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Sets a timeout for this call only.
    ///
    /// It bounds every attempt and retry wait together, not each attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}

/// Query parameters derived from an options struct.
///
/// Implementations emit only the fields that are set; unset options are
/// left out of the URL rather than sent empty.
pub trait QueryParams {
    /// Returns `(name, value)` pairs in a stable order.
    fn query_params(&self) -> Vec<(String, String)>;
}

/// Builds listing metadata from a path and optional query options.
pub(crate) fn listing<Q: QueryParams>(path: impl Into<String>, opt: Option<&Q>) -> RequestMetadata {
    let metadata = RequestMetadata::new(Method::GET, path);
    match opt {
        Some(opt) => metadata.with_query_params(opt.query_params()),
        None => metadata,
    }
}
