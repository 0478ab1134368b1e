//! Health check endpoints with component-level diagnostics.
//!
//! Provides:
//! - `/health`: simple "healthy" + version (for load balancers)
//! - `/health/detailed`: per-component status (database, bus)

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use trackside_ingest::MqttClient;
use trackside_store::TrackStore;

use crate::server::positions::PositionTracker;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Detailed health response with per-component checks
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// All component health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ComponentHealth,
    pub bus: ComponentHealth,
}

/// Individual component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: None,
        }
    }

    fn healthy_with_details(latency_ms: u64, details: serde_json::Value) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
            details: Some(details),
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: None,
        }
    }

    fn unhealthy_with_details(error: String, details: serde_json::Value) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
            details: Some(details),
        }
    }
}

/// Simple health check (for load balancers)
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

/// Detailed health check with all component statuses
async fn detailed_health_check(
    Extension(store): Extension<TrackStore>,
    Extension(bus): Extension<Arc<MqttClient>>,
    Extension(tracker): Extension<Arc<PositionTracker>>,
) -> Json<DetailedHealthResponse> {
    let db_health = check_database(&store).await;
    let bus_health = check_bus(&bus, &tracker);

    let components = [db_health.status, bus_health.status];

    let healthy_count = components.iter().filter(|s| **s == "healthy").count();
    let unhealthy_count = components.iter().filter(|s| **s == "unhealthy").count();

    let overall_status = if unhealthy_count == 0 {
        "healthy"
    } else if healthy_count > 0 {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            database: db_health,
            bus: bus_health,
        },
    })
}

/// Check database reachability
async fn check_database(store: &TrackStore) -> ComponentHealth {
    let start = std::time::Instant::now();
    match store.ping().await {
        Ok(()) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    }
}

/// Check broker connection state
fn check_bus(bus: &MqttClient, tracker: &PositionTracker) -> ComponentHealth {
    let state = bus.state();
    let details = serde_json::json!({
        "state": state.as_str(),
        "subscribed_topics": bus.topic_count(),
        "frames_processed": tracker.total_frames(),
    });
    if bus.is_connected() {
        ComponentHealth::healthy_with_details(0, details)
    } else {
        ComponentHealth::unhealthy_with_details(
            format!("broker not connected (state: {})", state.as_str()),
            details,
        )
    }
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}
