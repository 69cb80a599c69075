//! Error types for the pricing HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::query::QueryError;
use crate::session::SessionError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong login (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session not in a state that allows the request (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Project query failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// athena-common error
    #[error("Common error: {0}")]
    Common(#[from] athena_common::Error),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidLogin => ApiError::Unauthorized(e.to_string()),
            SessionError::MissingCredentials => ApiError::BadRequest(e.to_string()),
            SessionError::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Query(QueryError::CredentialsPending) => {
                (StatusCode::CONFLICT, "CREDENTIALS_PENDING")
            }
            ApiError::Query(QueryError::InvalidInput(_)) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Query(QueryError::Token(_)) => (StatusCode::BAD_GATEWAY, "TOKEN_ERROR"),
            ApiError::Query(QueryError::ProjectLookup(_)) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            ApiError::Query(QueryError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED")
            }
            ApiError::Common(athena_common::Error::InvalidInput(_))
            | ApiError::Common(athena_common::Error::MalformedPayload(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
