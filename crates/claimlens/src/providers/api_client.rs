use std::fmt;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use super::errors::ProviderError;

/// Default per-request timeout. Overridable through `with_timeout` since the
/// acceptable ceiling is deployment-specific.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Shared HTTP plumbing for provider calls: host, auth, default headers.
pub struct ApiClient {
    client: Client,
    host: String,
    auth: AuthMethod,
    default_headers: HeaderMap,
    timeout: Duration,
}

pub enum AuthMethod {
    BearerToken(String),
    ApiKey { header_name: String, key: String },
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::BearerToken(_) => f.debug_tuple("BearerToken").field(&"[hidden]").finish(),
            AuthMethod::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .field("key", &"[hidden]")
                .finish(),
        }
    }
}

pub struct ApiResponse {
    pub status: StatusCode,
    pub payload: Option<Value>,
}

impl ApiResponse {
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let payload = response.json().await.ok();
        Self { status, payload }
    }
}

impl ApiClient {
    pub fn new(host: impl Into<String>, auth: AuthMethod) -> Result<Self> {
        Self::with_timeout(host, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        host: impl Into<String>,
        auth: AuthMethod,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            host: host.into(),
            auth,
            default_headers: HeaderMap::new(),
            timeout,
        })
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(key.as_bytes())?;
        let header_value = HeaderValue::from_str(value)?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    pub async fn api_post(&self, path: &str, payload: &Value) -> Result<ApiResponse, ProviderError> {
        let url = self.build_url(path)?;
        tracing::debug!(%url, "posting provider request");

        let mut request = self
            .client
            .post(url)
            .headers(self.default_headers.clone());

        request = match &self.auth {
            AuthMethod::BearerToken(token) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            AuthMethod::ApiKey { header_name, key } => {
                request.header(header_name.as_str(), key.as_str())
            }
        };

        let response = request.json(payload).send().await?;
        Ok(ApiResponse::from_response(response).await)
    }

    fn build_url(&self, path: &str) -> Result<url::Url, ProviderError> {
        let mut base = url::Url::parse(&self.host)
            .map_err(|e| ProviderError::RequestFailed(format!("invalid base URL: {}", e)))?;

        // Url::join drops the last path segment unless the base ends in '/'.
        if !base.path().is_empty() && base.path() != "/" && !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        base.join(path)
            .map_err(|e| ProviderError::RequestFailed(format!("failed to construct URL: {}", e)))
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("host", &self.host)
            .field("auth", &self.auth)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
