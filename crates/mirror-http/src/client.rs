//! REST client for the resource endpoint
//!
//! Authenticates with a bot token header. Non-success responses whose
//! body carries a `type` discriminator are translated into the
//! [`FetchError`] taxonomy rather than surfacing the raw body.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use mirror_common::ApiConfig;
use mirror_core::{FetchError, FetchResult, Method, ResourceFetcher};

/// Header carrying the bot authentication token
const BOT_TOKEN_HEADER: &str = "x-bot-token";

/// HTTP client for the resource endpoint
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl RestClient {
    /// Create a client against the configured endpoint
    pub fn new(config: &ApiConfig) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Create a client against an explicit base URL with default settings
    pub fn with_base_url(base_url: impl Into<String>) -> FetchResult<Self> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(&config)
    }

    /// Record the token attached to subsequent requests
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Drop the recorded token
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn to_reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    /// Translate a non-success response into the error taxonomy
    async fn translate_error(response: reqwest::Response) -> FetchError {
        let status = response.status().as_u16();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) => return FetchError::from_remote("", status),
        };
        let discriminator = body
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        FetchError::from_remote(discriminator, status)
    }
}

#[async_trait]
impl ResourceFetcher for RestClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> FetchResult<Value> {
        let mut request = self
            .http
            .request(Self::to_reqwest_method(method), self.url(path));

        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(token) = self.token.read().as_deref() {
            request = request.header(BOT_TOKEN_HEADER, token);
        }

        tracing::trace!(method = %method, path = %path, "Resource request");

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::translate_error(response).await;
            tracing::debug!(method = %method, path = %path, code = error.code(), "Resource request failed");
            return Err(error);
        }

        // some mutations return an empty body on success
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.read().is_some())
            .finish()
    }
}
