//! Error types for trackside-ingest

use thiserror::Error;

/// Ingest error type
#[derive(Debug, Error)]
pub enum Error {
    /// Broker connection failed
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// Payload decoding failed
    #[error("decode error: {0}")]
    Decode(#[from] crate::decode::DecodeError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
