//! Session phase and API credential submission

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::session::SessionPhase;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub phase: SessionPhase,
    pub client_id: Option<String>,
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.read().await;
    Json(SessionResponse {
        phase: session.phase(),
        client_id: session.credentials().map(|c| c.client_id().to_string()),
    })
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// POST /api/credentials
///
/// Moves the session to `ready`. Blank values are rejected and leave the
/// session unchanged.
pub async fn submit_credentials(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let mut session = state.session.write().await;
    let updated = session
        .clone()
        .submit_credentials(&request.client_id, &request.client_secret)?;
    *session = updated;

    Ok(Json(SessionResponse {
        phase: session.phase(),
        client_id: session.credentials().map(|c| c.client_id().to_string()),
    }))
}
