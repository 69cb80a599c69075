//! OAuth2 client-credentials token provider

use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{TokenError, TokenProvider, USER_AGENT};
use crate::session::ApiCredentials;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts `grant_type=client_credentials` with HTTP basic auth
pub struct OAuthTokenProvider {
    http_client: reqwest::Client,
    token_url: String,
}

impl OAuthTokenProvider {
    pub fn new(token_url: impl Into<String>) -> Result<Self, TokenError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TokenError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            token_url: token_url.into(),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn token(&self, credentials: &ApiCredentials) -> Result<String, TokenError> {
        debug!(token_url = %self.token_url, "Requesting access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .header(header::ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Api(status.as_u16(), body));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| TokenError::Parse(e.to_string()))?;

        match payload.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                debug!("Access token acquired");
                Ok(token.to_string())
            }
            _ => {
                // Report keys only, the body may carry secrets
                let keys: Vec<&str> = payload
                    .as_object()
                    .map(|m| m.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                Err(TokenError::MissingAccessToken(format!("keys {:?}", keys)))
            }
        }
    }
}
