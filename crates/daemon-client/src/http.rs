//! HTTP plumbing for the daemon's REST API: configuration, URL
//! construction and the request/response/error mapping shared by every
//! endpoint wrapper in `api`.

use std::time::Duration;

use client_core::ApiError;
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

/// Authentication header attached to every daemon request.
pub const AUTH_HEADER: &str = "X-Authtoken";

/// Connection settings for the local daemon.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the daemon's REST API, e.g. `http://localhost:28080/v1`.
    pub base_url: Url,
    pub auth_token: String,
    /// Steady-state delay between background refreshes.
    pub poll_interval: Duration,
    /// Delay before retrying a failed background refresh.
    /// Kept short so a restarting daemon is picked up quickly.
    pub retry_delay: Duration,
    /// Per-request timeout; an elapsed timeout surfaces as
    /// `ApiError::Timeout` instead of a request stuck in flight.
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str, auth_token: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Network(format!("Invalid base URL: {}", e)))?;
        Ok(Self {
            base_url,
            auth_token: auth_token.into(),
            poll_interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        })
    }
}

/// Build the request URL for an API path.
///
/// The daemon routes require a trailing separator on every path except
/// the root `stats` path and paths carrying a query string. The base URL
/// may or may not end in a separator; the result always has exactly one
/// between base and path.
///
/// Ids and emails are substituted into paths by plain concatenation;
/// emails containing reserved URL characters are undefined behavior.
pub fn build_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path == "stats" || path.contains('?') {
        format!("{}/{}", base, path)
    } else {
        format!("{}/{}/", base, path.trim_end_matches('/'))
    }
}

/// Derive the streaming URL for an API path: same host and path rules,
/// scheme swapped to the WebSocket equivalent.
pub fn stream_url(base: &Url, path: &str) -> Result<String, ApiError> {
    let scheme = match base.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|_| ApiError::Network(format!("Cannot derive stream URL from {}", base)))?;
    Ok(build_url(url.as_str(), path))
}

/// Thin wrapper over `reqwest::Client` carrying the daemon config.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Issue a request and decode the JSON response into `T`.
    ///
    /// Never panics and never raises: transport, status and schema
    /// problems all come back as the matching `ApiError` variant.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = build_url(self.config.base_url.as_str(), path);
        let mut request = self
            .client
            .request(method, &url)
            .header(AUTH_HEADER, &self.config.auth_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}
