//! Live position endpoint
//!
//! GET /api/v1/positions - Latest sample per beacon plus track size

use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::error::{ApiResponse, ApiResult};
use crate::server::config::AppConfig;
use crate::server::positions::{PositionSample, PositionTracker};

/// Track dimensions from configuration
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackView {
    pub size_x: u32,
    pub size_y: u32,
}

/// Snapshot of the live position view
#[derive(Debug, Serialize, ToSchema)]
pub struct PositionsView {
    pub track: TrackView,
    pub count: usize,
    pub positions: Vec<PositionSample>,
}

/// Current position per beacon
#[utoipa::path(
    get,
    path = "/api/v1/positions",
    tag = "positions",
    responses(
        (status = 200, description = "Latest sample per beacon", body = PositionsView)
    )
)]
pub async fn get_positions(
    Extension(tracker): Extension<Arc<PositionTracker>>,
    Extension(config): Extension<AppConfig>,
) -> ApiResult<PositionsView> {
    let positions = tracker.snapshot();
    let view = PositionsView {
        track: TrackView {
            size_x: config.track.size_x,
            size_y: config.track.size_y,
        },
        count: positions.len(),
        positions,
    };
    Ok(Json(ApiResponse::success(view)))
}

/// Create position routes
pub fn position_routes() -> Router {
    Router::new().route("/api/v1/positions", get(get_positions))
}
