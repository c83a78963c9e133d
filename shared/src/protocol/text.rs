//! Structured text frame
//!
//! A JSON object with keys `name`, `profile`, `caller`. serde_json leaves
//! non-ASCII text unescaped, so raw UTF-8 survives the trip; only JSON's
//! mandatory escapes are applied.

use serde::{Deserialize, Serialize};

use super::WireError;
use crate::types::event::TraceEvent;

#[derive(Serialize)]
struct Record<'a> {
    name: &'a str,
    profile: &'a str,
    caller: &'a str,
}

#[derive(Deserialize)]
struct OwnedRecord {
    name: String,
    profile: String,
    caller: String,
}

pub(super) fn encode(event: &TraceEvent) -> Result<String, WireError> {
    let record = Record {
        name: &event.name,
        profile: &event.profile,
        caller: &event.stack,
    };
    Ok(serde_json::to_string(&record)?)
}

pub(super) fn decode(s: &str) -> Result<TraceEvent, WireError> {
    let record: OwnedRecord = serde_json::from_str(s)?;
    Ok(TraceEvent {
        name: record.name,
        profile: record.profile,
        stack: record.caller,
    })
}
