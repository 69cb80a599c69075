//! athena-pricing library interface
//!
//! Project pricing queries over the upstream resource API plus a read-only
//! JSON API for the display layer. Exposed as a library for integration
//! testing.

pub mod api;
pub mod client;
pub mod error;
pub mod query;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use athena_common::config::LoginConfig;
use athena_common::Flattener;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::query::PricingService;
use crate::session::SessionState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PricingService>,
    /// Session gate; one per running service
    pub session: Arc<RwLock<SessionState>>,
    /// Local login, `None` disables the login gate
    pub login: Option<LoginConfig>,
    /// Cancelled on shutdown; each query runs on a child token
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: PricingService, session: SessionState, login: Option<LoginConfig>) -> Self {
        Self {
            service: Arc::new(service),
            session: Arc::new(RwLock::new(session)),
            login,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        }
    }

    pub fn flattener(&self) -> &Flattener {
        &self.service.options().flattener
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require login when configured)
    let protected = Router::new()
        .route("/api/session", get(api::get_session))
        .route("/api/credentials", post(api::submit_credentials))
        .route("/api/projects/:project_number/pricing", get(api::get_project_pricing))
        .route("/api/wells/:well_id/inspect", get(api::inspect_well))
        .route("/api/flatten", post(api::flatten_payload))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::login_middleware,
        ));

    // Public routes
    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
