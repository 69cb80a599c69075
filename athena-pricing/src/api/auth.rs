//! Login middleware
//!
//! When a local login is configured, protected routes require HTTP basic
//! credentials matching it. The first accepted login moves the session out of
//! `Unauthenticated`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Login middleware
///
/// Applied to protected routes only; `/health` does not use it.
pub async fn login_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(login) = &state.login else {
        return next.run(request).await;
    };

    let Some((username, password)) = basic_credentials(request.headers()) else {
        return challenge(ApiError::Unauthorized("Login required".to_string()));
    };

    {
        let mut session = state.session.write().await;
        match session.clone().login(&username, &password, login) {
            Ok(next_state) => *session = next_state,
            Err(e) => {
                warn!(username = %username, "Login rejected");
                return challenge(e.into());
            }
        }
    }

    next.run(request).await
}

fn challenge(error: ApiError) -> Response {
    let mut response = error.into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Basic realm=\"athena-pricing\""),
    );
    response
}

/// Decode `Authorization: Basic base64(user:pass)`
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
