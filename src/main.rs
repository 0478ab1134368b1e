//! Trackside - Race tracking backend
//!
//! CLI entry point for the Trackside server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let config = server::load_config(cli.config.as_deref())?;

    let default_filter = if cli.debug || config.debug {
        "trackside=debug,trackside_ingest=debug,trackside_store=debug,tower_http=debug"
    } else {
        "trackside=info,trackside_ingest=info,trackside_store=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run(cli, config).await
}
