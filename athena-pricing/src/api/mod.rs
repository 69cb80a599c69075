//! HTTP API handlers for athena-pricing

pub mod auth;
pub mod flatten;
pub mod health;
pub mod inspect;
pub mod pricing;
pub mod session;

pub use auth::login_middleware;
pub use flatten::flatten_payload;
pub use health::health_routes;
pub use inspect::inspect_well;
pub use pricing::get_project_pricing;
pub use session::{get_session, submit_credentials};
