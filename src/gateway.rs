//! HTTP access to the remote API.
//!
//! Every call shares one failure contract: a non-success response surfaces the
//! body's `error` field when present, otherwise `HTTP <status>`; a request that
//! gets no response surfaces [`CONNECTIVITY_MESSAGE`]. Nothing here retries.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

use crate::error::{GatewayError, CONNECTIVITY_MESSAGE};
use crate::models::{Announcement, Credentials, FeatureFlag, LoginResponse};

/// Remote operations the session core depends on.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, GatewayError>;

    /// `GET /features`
    async fn features(&self, token: &str) -> Result<Vec<FeatureFlag>, GatewayError>;

    /// `GET /announcement`. A JSON `null` body means there is no announcement.
    async fn announcement(&self, token: &str) -> Result<Option<Announcement>, GatewayError>;
}

/// [`RemoteGateway`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with the JSON content type and optional bearer token.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, path);
        let mut req = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = req.send().await.map_err(|e| {
            tracing::debug!("Request failed without a response: {}", e);
            GatewayError::Connectivity(CONNECTIVITY_MESSAGE.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Status {
            status: status.as_u16(),
            message: error_message(status.as_u16(), &body),
        })
    }
}

/// The body's `error` string if it has one, otherwise `HTTP <status>`.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, GatewayError> {
        let req = self
            .request(Method::POST, "/auth/login", None)
            .json(credentials);
        self.send(req).await
    }

    async fn features(&self, token: &str) -> Result<Vec<FeatureFlag>, GatewayError> {
        self.send(self.request(Method::GET, "/features", Some(token)))
            .await
    }

    async fn announcement(&self, token: &str) -> Result<Option<Announcement>, GatewayError> {
        self.send(self.request(Method::GET, "/announcement", Some(token)))
            .await
    }
}
