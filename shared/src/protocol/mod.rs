//! Wire protocol between the agent and the native collector
//!
//! Two interchangeable encodings exist in the field: a length-prefixed
//! binary frame and a structured JSON record. Deployment configuration
//! selects one; both sides of a deployment must agree. Decoding exists so
//! collector-side tooling and tests can recover the original event exactly.

mod binary;
mod text;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::event::TraceEvent;

/// Errors raised while encoding or decoding a wire message.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("field `{field}` is {len} bytes, exceeding the u16 length limit")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("binary frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("binary frame shorter than its {0}-byte header")]
    MissingHeader(usize),

    #[error("field `{field}` is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("payload does not match the configured wire format")]
    PayloadMismatch,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Which encoding a deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Binary,
    Text,
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(WireFormat::Binary),
            "text" => Ok(WireFormat::Text),
            _ => Err(format!("unknown wire format: {s}")),
        }
    }
}

/// One encoded trace message, ready for the collector sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    Binary(Vec<u8>),
    Text(String),
}

impl WirePayload {
    pub fn len(&self) -> usize {
        match self {
            WirePayload::Binary(b) => b.len(),
            WirePayload::Text(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WireFormat {
    /// Encode an event into this format's payload.
    pub fn encode(&self, event: &TraceEvent) -> Result<WirePayload, WireError> {
        match self {
            WireFormat::Binary => binary::encode(event).map(WirePayload::Binary),
            WireFormat::Text => text::encode(event).map(WirePayload::Text),
        }
    }

    /// Decode a payload produced by [`WireFormat::encode`] back into the
    /// original event.
    pub fn decode(&self, payload: &WirePayload) -> Result<TraceEvent, WireError> {
        match (self, payload) {
            (WireFormat::Binary, WirePayload::Binary(bytes)) => binary::decode(bytes),
            (WireFormat::Text, WirePayload::Text(s)) => text::decode(s),
            _ => Err(WireError::PayloadMismatch),
        }
    }
}
