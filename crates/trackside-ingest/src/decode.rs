//! Telemetry payload decoding
//!
//! Frames on the wire are UTF-8 encoded JSON with an object at the top
//! level. Decoding is all-or-nothing: a frame that fails any step yields an
//! error and no decoded value.

use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a raw frame fails to decode
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload bytes are not valid UTF-8
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Payload text is not valid JSON
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload parsed, but the top-level value is not an object
    #[error("expected a top-level JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Decode a raw frame into a JSON object.
///
/// Arrays, numbers, strings, booleans and null at the top level are
/// rejected; interpretation of the object's fields is left to listeners.
pub fn decode_payload(raw: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    let text = std::str::from_utf8(raw)?;
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
