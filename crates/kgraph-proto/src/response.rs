//! Frames received from the watch stream.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::action::Action;
use crate::error::ProtoError;

/// One decoded frame of the watch stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchResponse {
    /// Ordered graph mutations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    /// Non-fatal problems reported by the server.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    /// Terminal error; the server closes the stream after sending it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WatchError>,
}

impl WatchResponse {
    /// Decode a frame from its JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decoding`] if the payload is not a valid frame.
    pub fn from_json(data: &[u8]) -> Result<Self, ProtoError> {
        serde_json::from_slice(data).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// A warning attached to a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Warning type.
    #[serde(rename = "t")]
    pub warning_type: String,
    /// Human-readable message.
    #[serde(rename = "m")]
    pub message: String,
    /// Structured details.
    #[serde(rename = "a", default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning: {}: {}", self.warning_type, self.message)?;
        if !self.attributes.is_empty() {
            write!(f, " ({})", Value::Object(self.attributes.clone()))?;
        }
        Ok(())
    }
}

/// A terminal error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code_string} ({code}): {reason}")]
pub struct WatchError {
    /// Numeric status code.
    pub code: u16,
    /// Symbolic status code.
    pub code_string: String,
    /// Explanation.
    pub reason: String,
}
