//! Messaging configuration

use serde::{Deserialize, Serialize};

/// Fallback client identifier when none is configured
pub const DEFAULT_CLIENT_ID: &str = "trackside-backend";

/// Broker connection and topic settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker hostname or IP address
    #[serde(default = "default_host")]
    pub host: String,
    /// Broker port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client identifier presented to the broker
    #[serde(default)]
    pub client_id: Option<String>,
    /// Username, when the broker requires authentication
    #[serde(default)]
    pub username: Option<String>,
    /// Password, when the broker requires authentication
    #[serde(default)]
    pub password: Option<String>,
    /// Keepalive interval in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
    /// Topic carrying inbound telemetry frames
    #[serde(default = "default_rx_topic")]
    pub rx_topic: String,
    /// Topic for outbound downlink frames
    #[serde(default = "default_tx_topic")]
    pub tx_topic: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_keepalive() -> u64 {
    60
}

fn default_rx_topic() -> String {
    "trackside/lora/rx".to_string()
}

fn default_tx_topic() -> String {
    "trackside/lora/tx".to_string()
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: None,
            username: None,
            password: None,
            keepalive_secs: default_keepalive(),
            rx_topic: default_rx_topic(),
            tx_topic: default_tx_topic(),
        }
    }
}

impl MqttConfig {
    /// Effective client identifier: the configured value or the crate default.
    #[must_use]
    pub fn effective_client_id(&self) -> String {
        self.client_id
            .clone()
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string())
    }
}
