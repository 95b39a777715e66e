//! The request pipeline shared by every endpoint.
//!
//! [`Client`] issues one logical call per invocation in one of two shapes:
//!
//! - [`Client::execute`] for writes: a JSON body, an allowlist of non-200
//!   statuses that still count as success, retry on 202 and 429.
//! - [`Client::get`] for listings: pagination headers are extracted and only
//!   429 is retried.
//!
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    metadata::RequestMetadata,
    rate_limit::{RateLimitConfig, RateLimitInfo},
    retry::{default_listing_predicate, default_mutation_predicate, RetryPredicate, RetryStrategy},
    Error, ProviderError, Response, Result,
};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// The public iNaturalist site, used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://www.inaturalist.org";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A client for the iNaturalist API.
///
/// Cloning is cheap and clones share one connection pool. A `Client` is
/// `Send + Sync`; concurrent calls from several tasks are safe because the
/// transport is internally synchronized and the configuration is read-only
/// after [`ClientBuilder::build`].
///
/// # Examples
///
/// ```no_run
/// use naturalist::Client;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), naturalist::Error> {
/// let client = Client::builder()
///     .bearer_token("my-access-token")?
///     .auto_retry(Duration::from_secs(5), 3)
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// let page = client.get_observations(None).await?;
/// for observation in &page {
///     println!("{} saw {:?}", observation.user_login.as_deref().unwrap_or("?"), observation.species_guess);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    mutation_retry: Box<dyn RetryPredicate>,
    listing_retry: Box<dyn RetryPredicate>,
    timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The root every request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Performs a mutating call.
    ///
    /// The call succeeds on 200 or on any status in `acceptable`. An empty
    /// body decodes to `None`, so `201 Created` with no content is a success.
    ///
    /// # Errors
    ///
    /// - [`Error::HttpError`] for any other status.
    /// - [`Error::MaxRetriesExceeded`] when 202/429 outlasted the retry strategy.
    /// - [`Error::DeserializationFailed`] when a non-empty body is not a `Res`.
    /// - [`Error::Network`] on transport failure.
    /// - [`Error::Timeout`] when the call, retries included, outlasts its timeout.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use naturalist::{Client, metadata::RequestMetadata};
    /// use http::{Method, StatusCode};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), naturalist::Error> {
    /// let client = Client::builder().bearer_token("token")?.build()?;
    ///
    /// let metadata = RequestMetadata::new(Method::POST, "/comments.json");
    /// let body = json!({"parent_type": "Observation", "parent_id": 1, "body": "Nice!"});
    /// client
    ///     .execute::<_, serde_json::Value>(metadata, Some(&body), &[StatusCode::CREATED])
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<Req, Res>(
        &self,
        metadata: RequestMetadata,
        body: Option<&Req>,
        acceptable: &[StatusCode],
    ) -> Result<Response<Option<Res>>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Error::SerializationFailed(e.to_string()))?;

        let start_time = Instant::now();
        let (status, headers, raw_body, attempts) = self
            .within_call_timeout(&metadata, async {
                let (response, attempts) = self
                    .send_with_retry(&metadata, body.as_ref(), self.inner.mutation_retry.as_ref())
                    .await?;
                let (status, headers, raw_body) = read_body(response).await?;
                Ok::<_, Error>((status, headers, raw_body, attempts))
            })
            .await?;
        let latency = start_time.elapsed();

        log_response(status, latency, attempts);

        if status != StatusCode::OK && !acceptable.contains(&status) {
            return Err(self.http_error(status, headers, raw_body));
        }

        let data = if raw_body.trim().is_empty() {
            None
        } else {
            Some(decode::<Res>(&raw_body, status)?)
        };

        Ok(Response::new(data, raw_body, status, headers, latency, attempts))
    }

    /// Performs a listing call.
    ///
    /// The method in `metadata` is ignored; listings are always GET. The
    /// returned [`Response::paging`] is `Some` only when the server sent
    /// `X-Total-Entries`.
    ///
    /// # Errors
    ///
    /// - [`Error::HttpError`] for any status other than 200.
    /// - [`Error::MaxRetriesExceeded`] when 429 outlasted the retry strategy.
    /// - [`Error::DeserializationFailed`] when the body is not a `Res`.
    /// - [`Error::Network`] on transport failure.
    /// - [`Error::Timeout`] when the call, retries included, outlasts its timeout.
    pub async fn get<Res>(&self, metadata: RequestMetadata) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata {
            method: Method::GET,
            ..metadata
        };

        let start_time = Instant::now();
        let (status, headers, raw_body, attempts) = self
            .within_call_timeout(&metadata, async {
                let (response, attempts) = self
                    .send_with_retry(&metadata, None, self.inner.listing_retry.as_ref())
                    .await?;
                let (status, headers, raw_body) = read_body(response).await?;
                Ok::<_, Error>((status, headers, raw_body, attempts))
            })
            .await?;
        let latency = start_time.elapsed();

        log_response(status, latency, attempts);

        if status != StatusCode::OK {
            return Err(self.http_error(status, headers, raw_body));
        }

        let data = decode::<Res>(&raw_body, status)?;
        Ok(Response::new(data, raw_body, status, headers, latency, attempts))
    }

    /// Bounds a whole call, every attempt and retry wait included, by the
    /// per-call timeout or else the client default.
    async fn within_call_timeout<T>(
        &self,
        metadata: &RequestMetadata,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match metadata.timeout.or(self.inner.timeout) {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                tracing::warn!(
                    timeout_ms = limit.as_millis(),
                    method = %metadata.method,
                    path = %metadata.path,
                    "Call timed out"
                );
                Error::Timeout
            })?,
            None => call.await,
        }
    }

    /// Sends the request, resending it while `predicate` says so and the
    /// strategy has retries left.
    ///
    /// Returns the first response that should not be retried together with
    /// the number of attempts made.
    async fn send_with_retry(
        &self,
        metadata: &RequestMetadata,
        body: Option<&serde_json::Value>,
        predicate: &dyn RetryPredicate,
    ) -> Result<(reqwest::Response, usize)> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let response = self.execute_request(metadata, body, attempt).await?;
            let status = response.status();

            if !self.inner.retry_strategy.is_enabled() || !predicate.should_retry(status, attempt) {
                return Ok((response, attempt));
            }

            // Drain the body so the connection goes back to the pool.
            let (status, headers, raw_body) = read_body(response).await?;
            let rate_limit_info = RateLimitInfo::from_headers(&headers);

            let Some(base_delay) = self.inner.retry_strategy.delay_for_attempt(attempt) else {
                tracing::warn!(
                    status = status.as_u16(),
                    attempts = attempt,
                    method = %metadata.method,
                    path = %metadata.path,
                    "Retries exhausted"
                );
                return Err(Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: Box::new(self.http_error(status, headers, raw_body)),
                });
            };

            let delay = self
                .inner
                .rate_limit_config
                .effective_delay(base_delay, rate_limit_info.as_ref());

            tracing::info!(
                status = status.as_u16(),
                delay_ms = delay.as_millis(),
                attempt = attempt,
                method = %metadata.method,
                path = %metadata.path,
                "Retrying request after delay"
            );

            tokio::time::sleep(delay).await;
        }
    }

    /// Executes a single request attempt.
    async fn execute_request(
        &self,
        metadata: &RequestMetadata,
        body: Option<&serde_json::Value>,
        attempt: usize,
    ) -> Result<reqwest::Response> {
        let url = self.build_url(metadata);

        tracing::debug!(
            method = %metadata.method,
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let mut request = self
            .inner
            .http_client
            .request(metadata.method.clone(), url)
            .header(header::ACCEPT, "application/json");

        for (name, value) in &self.inner.default_headers {
            request = request.header(name, value);
        }

        for (name, value) in &metadata.headers {
            request = request.header(name, value);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            tracing::warn!(error = %e, attempt = attempt, path = %metadata.path, "Request failed");
            Error::from_transport(e)
        })
    }

    /// Resolves the metadata path and query against the base URL.
    ///
    /// A base URL with a path prefix (e.g. `https://host/api`) keeps it.
    fn build_url(&self, metadata: &RequestMetadata) -> Url {
        let mut url = self.inner.base_url.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), metadata.path);
        url.set_path(&path);

        for (key, value) in &metadata.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        url
    }

    fn http_error(&self, status: StatusCode, headers: HeaderMap, raw_response: String) -> Error {
        if status.is_client_error() {
            tracing::error!(status = status.as_u16(), response = %raw_response, "Client error (4xx)");
        } else if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), response = %raw_response, "Server error (5xx)");
        } else {
            tracing::warn!(status = status.as_u16(), "Unexpected status");
        }

        let rate_limit_info = if self.inner.rate_limit_config.enabled {
            RateLimitInfo::from_headers(&headers)
        } else {
            None
        };

        Error::HttpError {
            status,
            provider_error: ProviderError::from_body(&raw_response),
            raw_response,
            headers,
            rate_limit_info,
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("retry_strategy", &self.inner.retry_strategy)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

/// Reads the body to completion, releasing the connection.
async fn read_body(response: reqwest::Response) -> Result<(StatusCode, HeaderMap, String)> {
    let status = response.status();
    let headers = response.headers().clone();
    let raw_body = response.text().await.map_err(Error::from_transport)?;
    Ok((status, headers, raw_body))
}

fn decode<Res: DeserializeOwned>(raw_body: &str, status: StatusCode) -> Result<Res> {
    serde_json::from_str::<Res>(raw_body).map_err(|e| {
        tracing::error!(
            error = %e,
            raw_response = %raw_body,
            "Failed to deserialize response"
        );

        Error::DeserializationFailed {
            raw_response: raw_body.to_string(),
            serde_error: e.to_string(),
            status,
        }
    })
}

fn log_response(status: StatusCode, latency: Duration, attempts: usize) {
    tracing::info!(
        status = status.as_u16(),
        latency_ms = latency.as_millis(),
        attempts = attempts,
        "Received HTTP response"
    );
}

/// Builder for configuring and creating a [`Client`].
///
/// Defaults: base URL [`DEFAULT_BASE_URL`], no authentication, no retries,
/// no timeout, rate limit headers honored.
///
/// # Examples
///
/// ```no_run
/// use naturalist::{ClientBuilder, RetryStrategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), naturalist::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://staging.example.org")?
///     .retry_strategy(RetryStrategy::Fixed {
///         delay: Duration::from_secs(2),
///         max_retries: 10,
///     })
///     .default_header("X-Via", "field-app")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    mutation_retry: Option<Box<dyn RetryPredicate>>,
    listing_retry: Option<Box<dyn RetryPredicate>>,
    timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            retry_strategy: RetryStrategy::None,
            mutation_retry: None,
            listing_retry: None,
            timeout: None,
            rate_limit_config: RateLimitConfig::default(),
        }
    }

    /// Sets the API root. Useful for staging servers and tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry a path.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        if url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL cannot be a base: {}",
                url
            )));
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Authenticates every request with `Authorization: Bearer <token>`.
    ///
    /// The header is marked sensitive so it is never printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains characters not allowed in a header.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Result<Self> {
        let mut value = HeaderValue::try_from(format!("Bearer {}", token.as_ref()))
            .map_err(|_| Error::ConfigurationError("Invalid bearer token".to_string()))?;
        value.set_sensitive(true);
        self.default_headers.insert(header::AUTHORIZATION, value);
        Ok(self)
    }

    /// Sets the retry strategy.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Enables retries with a fixed wait of `retry_duration`, at most
    /// `max_retries` times.
    pub fn auto_retry(self, retry_duration: Duration, max_retries: usize) -> Self {
        self.retry_strategy(RetryStrategy::Fixed {
            delay: retry_duration,
            max_retries,
        })
    }

    /// Replaces the statuses retried by [`Client::execute`] (default 202, 429).
    pub fn mutation_retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.mutation_retry = Some(predicate);
        self
    }

    /// Replaces the statuses retried by [`Client::get`] (default 429).
    pub fn listing_retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.listing_retry = Some(predicate);
        self
    }

    /// Sets the default per-call timeout.
    ///
    /// The limit covers the whole call: every attempt, every retry wait and
    /// reading the final body. Expiry yields [`Error::Timeout`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the rate limit configuration.
    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = config;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                retry_strategy: self.retry_strategy,
                mutation_retry: self
                    .mutation_retry
                    .unwrap_or_else(default_mutation_predicate),
                listing_retry: self.listing_retry.unwrap_or_else(default_listing_predicate),
                timeout: self.timeout,
                rate_limit_config: self.rate_limit_config,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_client_is_send_sync() {
        assert_send_sync::<Client>();
    }

    #[test]
    fn test_default_base_url() {
        let client = Client::builder().build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://www.inaturalist.org/");
    }

    #[test]
    fn test_build_url_with_query() {
        let client = Client::builder().build().unwrap();
        let metadata = RequestMetadata::new(Method::GET, "/observations.json")
            .with_query_param("page", "2");
        assert_eq!(
            client.build_url(&metadata).as_str(),
            "https://www.inaturalist.org/observations.json?page=2"
        );
    }

    #[test]
    fn test_build_url_without_query_has_no_question_mark() {
        let client = Client::builder().build().unwrap();
        let metadata = RequestMetadata::new(Method::GET, "/projects.json");
        assert_eq!(
            client.build_url(&metadata).as_str(),
            "https://www.inaturalist.org/projects.json"
        );
    }

    #[test]
    fn test_build_url_keeps_base_path_prefix() {
        let client = Client::builder()
            .base_url("http://localhost:8080/api/")
            .unwrap()
            .build()
            .unwrap();
        let metadata = RequestMetadata::new(Method::GET, "/users/edit.json");
        assert_eq!(
            client.build_url(&metadata).as_str(),
            "http://localhost:8080/api/users/edit.json"
        );
    }

    #[test]
    fn test_unusable_base_url_is_rejected() {
        assert!(matches!(
            Client::builder().base_url("not a url"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            Client::builder().base_url("mailto:someone@example.org"),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_bearer_token_is_sensitive() {
        let builder = Client::builder().bearer_token("secret").unwrap();
        let value = builder.default_headers.get(header::AUTHORIZATION).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer secret");
    }

    #[test]
    fn test_bearer_token_rejects_newlines() {
        assert!(Client::builder().bearer_token("bad\ntoken").is_err());
    }
}
