//! CLI module for Trackside
//!
//! Provides commands:
//! - `serve`: Run the backend server (default when no command is given)
//! - `doctor`: System diagnostics and connectivity checks

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::server::config::AppConfig;

pub mod doctor;

/// Trackside backend CLI
#[derive(Parser, Debug)]
#[command(name = "trackside")]
#[command(about = "Race tracking backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Extra configuration file, applied on top of config/default.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run system diagnostics
    Doctor,
    /// Start the server (default)
    Serve,
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Doctor) => doctor::run(&config).await,
        Some(Commands::Serve) | None => crate::server::run(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_args_defaults_to_serve() {
        let cli = Cli::parse_from(["trackside"]);
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_doctor_with_global_flags() {
        let cli = Cli::parse_from(["trackside", "doctor", "--config", "race.toml", "--debug"]);
        assert!(matches!(cli.command, Some(Commands::Doctor)));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("race.toml")));
        assert!(cli.debug);
    }
}
