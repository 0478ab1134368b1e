//! Web API module for Trackside
//!
//! Provides REST API endpoints for:
//! - Team management and beacon assignment
//! - Race planning and lifecycle control
//! - Live position view
//! - Health diagnostics

pub mod docs;
pub mod error;
pub mod health;
pub mod positions;
pub mod races;
pub mod teams;

use axum::Router;

pub use docs::docs_routes;
pub use error::{ApiError, ApiResponse, ApiResult};
pub use health::health_routes;
pub use positions::position_routes;
pub use races::race_routes;
pub use teams::team_routes;

/// Create the API router with all resource endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(team_routes())
        .merge(race_routes())
        .merge(position_routes())
}
