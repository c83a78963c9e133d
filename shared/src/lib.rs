//! Shared types and utilities for Callwire
//!
//! This crate contains the trace event model, the bounded-string helpers,
//! and the wire protocol used between the in-process agent and the native
//! collector.

pub mod protocol;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use protocol::{WireError, WireFormat, WirePayload};
pub use types::event::{TraceEvent, LIGHTWEIGHT_SENTINEL};
