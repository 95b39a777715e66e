//! Response wrapper that keeps the decoded data next to the transport details.

use crate::pagination::PageHeaders;
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful response from the pipeline.
///
/// # Examples
///
/// ```no_run
/// use naturalist::{Client, metadata::RequestMetadata};
/// use http::Method;
///
/// # async fn example() -> Result<(), naturalist::Error> {
/// let client = Client::builder().build()?;
///
/// let metadata = RequestMetadata::new(Method::GET, "/observations.json");
/// let response = client.get::<serde_json::Value>(metadata).await?;
///
/// println!("Status: {}", response.status);
/// println!("Took {:?} over {} attempt(s)", response.latency, response.attempts);
/// if let Some(paging) = response.paging {
///     println!("{} observations in total", paging.total_entries);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body.
    pub raw_body: String,

    /// The HTTP status code of the final attempt.
    pub status: StatusCode,

    /// The response headers of the final attempt.
    pub headers: HeaderMap,

    /// Pagination metadata, present only when `X-Total-Entries` was sent.
    pub paging: Option<PageHeaders>,

    /// Time from the first attempt to the decoded response, retry waits included.
    pub latency: Duration,

    /// Number of attempts made; `1` when no retry was needed.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`, deriving `paging` from the headers.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        let paging = PageHeaders::from_headers(&headers);
        Self {
            data,
            raw_body,
            status,
            headers,
            paging,
            latency,
            attempts,
        }
    }

    /// Maps the response data while keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use naturalist::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     vec![1, 2, 3],
    ///     "[1,2,3]".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let count = response.map(|v| v.len());
    /// assert_eq!(count.data, 3);
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            paging: self.paging,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
