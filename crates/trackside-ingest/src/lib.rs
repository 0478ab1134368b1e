//! Trackside Ingest - MQTT telemetry ingestion
//!
//! This crate provides the messaging backbone of the Trackside backend:
//! - Client: managed broker connection with a topic/callback registry,
//!   automatic resubscription on reconnect and fire-and-forget publishing
//! - Decode: strict JSON-object payload decoding
//! - Handler: fan-out of decoded telemetry frames to in-process listeners

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod handler;

pub use client::{ConnectionState, MessageCallback, MqttClient};
pub use config::MqttConfig;
pub use decode::{decode_payload, DecodeError};
pub use error::{Error, Result};
pub use handler::{TelemetryHandler, TelemetryListener, TelemetryMessage};

// Re-export so consumers can pass QoS flags without a direct rumqttc dependency.
pub use rumqttc::QoS;
