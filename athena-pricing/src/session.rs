//! Session gating as an explicit state value
//!
//! `Unauthenticated → CredentialsPending → Ready`. The login step is skipped
//! when no local login is configured. A query only runs against a `Ready`
//! session, which is the only state holding API client credentials.

use athena_common::config::{is_valid_value, LoginConfig};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid username or password.")]
    InvalidLogin,

    #[error("Both Client ID and Client Secret are required.")]
    MissingCredentials,

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

/// OAuth2 client credentials; the secret never appears in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    client_id: String,
    client_secret: String,
}

impl ApiCredentials {
    /// Both values must be non-blank
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, SessionError> {
        if !is_valid_value(client_id) || !is_valid_value(client_secret) {
            return Err(SessionError::MissingCredentials);
        }
        Ok(Self {
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Phase name as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    CredentialsPending,
    Ready,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Unauthenticated => "unauthenticated",
            SessionPhase::CredentialsPending => "credentials_pending",
            SessionPhase::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    CredentialsPending,
    Ready(ApiCredentials),
}

impl SessionState {
    /// Initial state: `Unauthenticated` when a login is required
    pub fn new(login_required: bool) -> Self {
        if login_required {
            SessionState::Unauthenticated
        } else {
            SessionState::CredentialsPending
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Unauthenticated => SessionPhase::Unauthenticated,
            SessionState::CredentialsPending => SessionPhase::CredentialsPending,
            SessionState::Ready(_) => SessionPhase::Ready,
        }
    }

    /// Check a username/password pair against the configured login
    pub fn login(self, username: &str, password: &str, expected: &LoginConfig) -> Result<Self, SessionError> {
        if !expected.matches(username, password) {
            return Err(SessionError::InvalidLogin);
        }
        match self {
            SessionState::Unauthenticated => {
                info!(username = %username, "Login accepted");
                Ok(SessionState::CredentialsPending)
            }
            // Already past the gate
            other => Ok(other),
        }
    }

    /// Store API credentials; replaces earlier ones when already `Ready`
    pub fn submit_credentials(self, client_id: &str, client_secret: &str) -> Result<Self, SessionError> {
        if let SessionState::Unauthenticated = self {
            return Err(SessionError::InvalidTransition {
                action: "submit credentials",
                phase: SessionPhase::Unauthenticated.as_str(),
            });
        }
        let credentials = ApiCredentials::new(client_id, client_secret)?;
        info!(client_id = %credentials.client_id(), "API credentials stored");
        Ok(SessionState::Ready(credentials))
    }

    pub fn credentials(&self) -> Option<&ApiCredentials> {
        match self {
            SessionState::Ready(credentials) => Some(credentials),
            _ => None,
        }
    }
}

/// Username/password comparison for [`LoginConfig`]
pub trait LoginCheck {
    fn matches(&self, username: &str, password: &str) -> bool;
}

impl LoginCheck for LoginConfig {
    fn matches(&self, username: &str, password: &str) -> bool {
        let username_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let password_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        username_ok & password_ok
    }
}

/// Byte comparison that does not stop at the first mismatch.
///
/// Only the length of the inputs is revealed by timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
