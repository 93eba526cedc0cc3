//! HTTP client shared by the capability probe and the alert query

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::config::HttpConfig;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Authentication failed")]
    AuthFailed,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Query statement failed: {0}")]
    Statement(String),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Thin JSON client around `reqwest`.
///
/// Source links are absolute URLs or paths relative to `base_url`.
#[derive(Clone, Debug)]
pub struct SourceClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SourceClient {
    /// Create a new client
    pub fn new(base_url: &str, config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a link against the base URL
    pub fn url_for(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else if link.starts_with('/') {
            format!("{}{}", self.base_url, link)
        } else {
            format!("{}/{}", self.base_url, link)
        }
    }

    /// Build headers for requests
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, link: &str) -> Result<T> {
        let url = self.url_for(link);
        tracing::debug!(method = "GET", url = %url, "Source request");

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, link: &str, body: &B) -> Result<T> {
        let url = self.url_for(link);
        tracing::debug!(method = "POST", url = %url, "Source request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else if status.as_u16() == 401 {
            Err(ClientError::AuthFailed)
        } else if status.as_u16() == 404 {
            Err(ClientError::NotFound(response.url().path().to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
