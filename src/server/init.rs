//! Server initialization and main run loop
//!
//! Contains the main `run()` function that starts all server components.

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Extension, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use trackside_ingest::{MqttClient, TelemetryHandler};
use trackside_store::TrackStore;

use super::config::AppConfig;
use super::positions::PositionTracker;

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    info!(
        "Starting {} v{}",
        config.app_name,
        env!("CARGO_PKG_VERSION")
    );

    let store = TrackStore::from_path(std::path::Path::new(&config.database.path))
        .await
        .context("Failed to open database")?;

    // Bus client. A broker outage must not keep the HTTP API down, so a
    // failed connect degrades instead of aborting; /health/detailed
    // reports the bus as unhealthy until a restart.
    let mut mqtt_config = config.mqtt.clone();
    mqtt_config.client_id = Some(config.mqtt_client_id());
    let bus = Arc::new(MqttClient::new(mqtt_config));
    match bus.start().await {
        Ok(()) => info!(host = %config.mqtt.host, port = config.mqtt.port, "bus connected"),
        Err(e) => warn!(error = %e, "broker unreachable, starting degraded"),
    }

    // Telemetry ingestion on the uplink topic
    let handler = Arc::new(TelemetryHandler::new(
        Arc::clone(&bus),
        config.mqtt.rx_topic.clone(),
    ));
    handler.start().await;

    // Live position view fed by the handler
    let tracker = Arc::new(PositionTracker::new());
    handler.add_listener(Arc::clone(&tracker).listener());

    // Build the main router with all endpoints
    let app = Router::new()
        // Health endpoints (for LB and diagnostics)
        .merge(crate::api::health_routes())
        // API documentation (Swagger UI at /docs)
        .merge(crate::api::docs_routes())
        // API routes
        .merge(crate::api::api_router())
        .route("/", get(|| async { "Trackside Backend" }))
        // Layers (applied to all routes)
        .layer(Extension(store))
        .layer(Extension(Arc::clone(&bus)))
        .layer(Extension(Arc::clone(&tracker)))
        .layer(Extension(config.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Stop ingestion before the bus so the unsubscribe still has a client.
    handler.stop().await;
    bus.stop().await;

    info!("Trackside shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
