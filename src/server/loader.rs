//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment.
///
/// `explicit` is an operator-supplied config file (`--config`); it must exist
/// when given and overrides the optional `config/` files.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(File::from(path));
    }

    let config = builder
        // 3. Environment variables (highest priority)
        // prefix_separator("_") ensures TRACKSIDE_MQTT__HOST works (single _
        // after prefix). config-rs 0.14 otherwise defaults prefix_separator to
        // separator ("__"), requiring TRACKSIDE__MQTT__HOST.
        .add_source(
            Environment::with_prefix("TRACKSIDE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(app.app_name, "Trackside Backend");
        assert_eq!(app.server.host, "127.0.0.1");
        assert_eq!(app.server.port, 8000);
        assert_eq!(app.mqtt.rx_topic, "trackside/lora/rx");
        assert_eq!(app.mqtt.tx_topic, "trackside/lora/tx");
        assert_eq!(app.track.size_y, 75);
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let result = load_config(Some(Path::new("/nonexistent/trackside.toml")));
        assert!(result.is_err());
    }
}
