//! HTTP client with timeouts and bounded response bodies

use futures::StreamExt;
use pd_errors::{Error, NetworkError};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Largest response body accepted by default
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 32 * 1024 * 1024;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub max_response_bytes: u64,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(15),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: format!("pd/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client wrapper
///
/// Requests are attempted once. Retry policy belongs to whoever invoked the
/// engine.
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// POST `body` as JSON and decode a JSON reply.
    ///
    /// # Errors
    ///
    /// Returns a `NetworkError` for transport failures, non-success statuses,
    /// bodies over the configured limit and undecodable replies.
    pub async fn post_json<B, R>(&self, url: &str, api_key: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self
            .client
            .post(parsed)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::convert_error(&e, url))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
            }
            .into());
        }

        let limit = self.config.max_response_bytes;
        if let Some(length) = response.content_length() {
            if length > limit {
                return Err(NetworkError::ResponseTooLarge {
                    size: length,
                    limit,
                }
                .into());
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::convert_error(&e, url))?;
            let size = (body.len() + chunk.len()) as u64;
            if size > limit {
                return Err(NetworkError::ResponseTooLarge { size, limit }.into());
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body)
            .map_err(|e| NetworkError::MalformedResponse(format!("{url}: {e}")).into())
    }

    fn convert_error(error: &reqwest::Error, url: &str) -> Error {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string()).into()
        } else {
            NetworkError::RequestFailed(error.to_string()).into()
        }
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
