//! Server configuration types
//!
//! Contains all configuration structures for the Trackside server.

use serde::{Deserialize, Serialize};
use trackside_ingest::MqttConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub debug: bool,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub track: TrackConfig,
}

fn default_app_name() -> String {
    "Trackside Backend".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            debug: false,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            mqtt: MqttConfig::default(),
            track: TrackConfig::default(),
        }
    }
}

impl AppConfig {
    /// MQTT client ID derived from the app name unless one is configured.
    pub fn mqtt_client_id(&self) -> String {
        match &self.mqtt.client_id {
            Some(id) => id.clone(),
            None => self.app_name.to_lowercase().replace(' ', "-"),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, created on first run
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/trackside.db".to_string(),
        }
    }
}

/// Track geometry exposed alongside live positions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    #[serde(default = "default_track_size")]
    pub size_x: u32,
    #[serde(default = "default_track_size")]
    pub size_y: u32,
}

fn default_track_size() -> u32 {
    75
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            size_x: default_track_size(),
            size_y: default_track_size(),
        }
    }
}
