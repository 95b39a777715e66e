//! OAuth2 authorization-code login.
//!
//! The flow is:
//!
//! 1. Send the user to [`Authenticator::authorization_url`].
//! 2. The provider redirects back to the configured redirect URL with a
//!    `code` query parameter.
//! 3. Trade the code for a [`Token`] with [`Authenticator::exchange`].
//! 4. Build an authenticated [`Client`] with [`Authenticator::new_client`].
//!
//! Server-to-server callers holding a pre-shared token can skip to
//! [`Authenticator::client_from_access_token`].

use crate::{client::DEFAULT_BASE_URL, Client, ClientBuilder, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

const AUTHORIZE_PATH: &str = "/oauth/authorize";
const TOKEN_PATH: &str = "/oauth/token";

/// Application credentials and endpoints for the OAuth2 flow.
///
/// # Examples
///
/// ```
/// use naturalist::AuthConfig;
///
/// let config = AuthConfig::new("app-id", "app-secret", "http://localhost:8000/callback")
///     .with_scopes(["write"]);
/// assert_eq!(config.scopes, vec!["write".to_string()]);
/// ```
#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Space-joined into the `scope` parameter.
    pub scopes: Vec<String>,
    /// API root; also the root of the OAuth endpoints unless overridden.
    pub base_url: String,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
}

impl AuthConfig {
    /// Creates a configuration against the public site with no scopes.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scopes: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            authorize_url: None,
            token_url: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Points both the API and the OAuth endpoints at another root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = Some(url.into());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("base_url", &self.base_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// A bearer token issued by the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Wraps a pre-obtained access token.
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            scope: None,
            expires_at: None,
        }
    }

    /// Returns `true` if the provider gave an expiry and it has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    refresh_token: Option<String>,
    scope: Option<String>,
    expires_in: Option<i64>,
    /// Unix seconds; the provider sends it instead of relying on our clock.
    created_at: Option<i64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    fn into_token(self) -> Token {
        let expires_at = self.expires_in.and_then(|expires_in| {
            let issued = self.created_at.unwrap_or_else(|| Utc::now().timestamp());
            DateTime::<Utc>::from_timestamp(issued.saturating_add(expires_in), 0)
        });

        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            scope: self.scope,
            expires_at,
        }
    }
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Drives the authorization-code flow and hands out authenticated clients.
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: AuthConfig,
    authorize_url: Url,
    token_url: Url,
    http_client: reqwest::Client,
}

impl Authenticator {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] or [`Error::ConfigurationError`] if any
    /// configured URL is unusable.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let root = base_url.as_str().trim_end_matches('/');

        let authorize_url = match &config.authorize_url {
            Some(url) => Url::parse(url)?,
            None => Url::parse(&format!("{}{}", root, AUTHORIZE_PATH))?,
        };
        let token_url = match &config.token_url {
            Some(url) => Url::parse(url)?,
            None => Url::parse(&format!("{}{}", root, TOKEN_PATH))?,
        };
        Url::parse(&config.redirect_url)?;

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            config,
            authorize_url,
            token_url,
            http_client,
        })
    }

    /// The URL to send the user to for consent.
    ///
    /// # Examples
    ///
    /// ```
    /// use naturalist::{AuthConfig, Authenticator};
    ///
    /// let auth = Authenticator::new(AuthConfig::new("abc", "secret", "http://localhost/cb")).unwrap();
    /// assert_eq!(
    ///     auth.authorization_url(),
    ///     "https://www.inaturalist.org/oauth/authorize?client_id=abc\
    ///      &redirect_uri=http%3A%2F%2Flocalhost%2Fcb&response_type=code&scope="
    /// );
    /// ```
    pub fn authorization_url(&self) -> String {
        let mut url = self.authorize_url.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "));
        url.to_string()
    }

    /// Trades an authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthExchange`] if the token endpoint is unreachable,
    /// answers with a non-success status, or sends an unreadable token.
    pub async fn exchange(&self, code: &str) -> Result<Token> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        tracing::debug!(token_url = %self.token_url, "Exchanging authorization code");

        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| exchange_error(None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| exchange_error(Some(status), e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OAuthErrorBody>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or(body);
            return Err(exchange_error(Some(status), message));
        }

        let token = serde_json::from_str::<TokenResponse>(&body)
            .map_err(|e| exchange_error(Some(status), format!("Unreadable token response: {}", e)))?
            .into_token();

        tracing::info!(
            scope = token.scope.as_deref().unwrap_or(""),
            expires_at = ?token.expires_at,
            "Obtained access token"
        );
        Ok(token)
    }

    /// A client builder pointed at the configured API root and carrying
    /// `token`, for callers that want retries or timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or token is unusable.
    pub fn client_builder(&self, token: &Token) -> Result<ClientBuilder> {
        Client::builder()
            .base_url(&self.config.base_url)?
            .bearer_token(&token.access_token)
    }

    /// An authenticated client with retries disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or token is unusable.
    pub fn new_client(&self, token: &Token) -> Result<Client> {
        self.client_builder(token)?.build()
    }

    /// An authenticated client from a pre-obtained access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or token is unusable.
    pub fn client_from_access_token(&self, access_token: &str) -> Result<Client> {
        self.new_client(&Token::from_access_token(access_token))
    }
}

fn exchange_error(status: Option<http::StatusCode>, message: String) -> Error {
    tracing::warn!(status = ?status, message = %message, "Token exchange failed");
    Error::AuthExchange { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(config: AuthConfig) -> Authenticator {
        Authenticator::new(config).unwrap()
    }

    #[test]
    fn test_authorization_url_with_empty_scope() {
        let auth = authenticator(AuthConfig::new("abc", "s", "http://localhost/cb"));
        assert_eq!(
            auth.authorization_url(),
            "https://www.inaturalist.org/oauth/authorize?client_id=abc&redirect_uri=http%3A%2F%2Flocalhost%2Fcb&response_type=code&scope="
        );
    }

    #[test]
    fn test_authorization_url_joins_scopes_with_space() {
        let auth = authenticator(
            AuthConfig::new("abc", "s", "http://localhost/cb").with_scopes(["login", "write"]),
        );
        assert!(auth.authorization_url().ends_with("&scope=login+write"));
    }

    #[test]
    fn test_authorize_url_follows_base_url() {
        let auth = authenticator(
            AuthConfig::new("abc", "s", "http://localhost/cb").with_base_url("http://127.0.0.1:3000/"),
        );
        assert!(auth
            .authorization_url()
            .starts_with("http://127.0.0.1:3000/oauth/authorize?client_id=abc"));
    }

    #[test]
    fn test_unparsable_urls_fail_at_construction() {
        let config = AuthConfig::new("abc", "s", "http://localhost/cb").with_base_url("::nope::");
        assert!(Authenticator::new(config).is_err());

        let config = AuthConfig::new("abc", "s", "not a redirect");
        assert!(matches!(Authenticator::new(config), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_token_expiry_from_created_at() {
        let response = TokenResponse {
            access_token: "a".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            scope: Some("write".to_string()),
            expires_in: Some(60),
            created_at: Some(1_000),
        };
        let token = response.into_token();
        assert_eq!(token.expires_at.unwrap().timestamp(), 1_060);
        assert!(token.is_expired());
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = Token::from_access_token("a");
        assert!(!token.is_expired());
        assert_eq!(token.token_type, "Bearer");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut token = Token::from_access_token("super-secret");
        token.refresh_token = Some("also-secret".to_string());
        let printed = format!("{:?}", token);
        assert!(!printed.contains("secret"));

        let config = AuthConfig::new("abc", "hunter2", "http://localhost/cb");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
