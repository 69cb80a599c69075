//! Bearer-authenticated JSON resource fetcher

use async_trait::async_trait;
use reqwest::{header, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{FetchError, ResourceFetcher, USER_AGENT};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// GETs resources with `Authorization: Bearer` and `Accept: application/json`
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &Url, token: &str) -> Result<Value, FetchError> {
        debug!(url = %url, "Fetching resource");

        let response = self
            .http_client
            .get(url.clone())
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16(), body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
