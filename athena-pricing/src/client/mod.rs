//! Upstream collaborators: OAuth2 token provider and resource fetcher
//!
//! The pricing core never talks to the network. These traits are the seam
//! between the query runner and HTTP, so tests can substitute canned
//! payloads.

pub mod endpoints;
pub mod fetcher;
pub mod token;

pub use endpoints::{ApiEndpoints, WellResource};
pub use fetcher::HttpFetcher;
pub use token::OAuthTokenProvider;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::session::ApiCredentials;

pub(crate) const USER_AGENT: &str = concat!("athena-pricing/", env!("CARGO_PKG_VERSION"));

/// Resource fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<FetchError> for athena_common::Error {
    fn from(e: FetchError) -> Self {
        athena_common::Error::UpstreamFetch(e.to_string())
    }
}

/// Token acquisition errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Token endpoint error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unexpected token response: {0}")]
    MissingAccessToken(String),
}

/// Supplies a bearer token for a set of client credentials
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, credentials: &ApiCredentials) -> Result<String, TokenError>;
}

/// Fetches one resource URL as parsed JSON
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Parsed body, `Value::Null` for an empty body
    async fn fetch_json(&self, url: &Url, token: &str) -> Result<Value, FetchError>;
}
