//! The network seam under the session client.
//!
//! `Transport` performs exactly one HTTP exchange and reports what came
//! back. Classification, rate-limit retries and the refresh protocol all
//! live above it in `SessionClient`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::{ApiError, ApiRequest};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`, attaching `token` as a bearer credential when given.
    /// Only failures where no response arrived are returned as `Err`.
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<RawResponse, ApiError>;
}

/// reqwest-backed transport against a fixed base URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<RawResponse, ApiError> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, url = %url, authenticated = token.is_some(), "Sending request");

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(url = %url, status = status.as_u16(), "Response received");

        Ok(RawResponse { status, body })
    }
}
