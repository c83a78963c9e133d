//! Trace event model
//!
//! A `TraceEvent` is the unit of capture: one hooked call produces one
//! event, which is encoded and handed to the collector, then dropped.
//! Events are never buffered or retained on the agent side.

use serde::{Deserialize, Serialize};

use crate::utils::sanitize::{sanitize, truncate_chars};

/// Maximum length of the qualified method name, in characters.
pub const MAX_NAME_CHARS: usize = 512;

/// Maximum length of the argument profile, in characters.
pub const MAX_PROFILE_CHARS: usize = 2048;

/// Maximum length of the caller stack text, in characters.
pub const MAX_STACK_CHARS: usize = 4096;

/// Fixed value substituted for profile and stack when lightweight mode is on.
pub const LIGHTWEIGHT_SENTINEL: &str = "LW";

/// One captured call: qualified method name, argument profile, caller stack.
///
/// Field lengths are bounded at construction (see [`TraceEvent::bounded`]),
/// which keeps every field's UTF-8 byte length under the binary wire
/// format's u16 limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub name: String,
    pub profile: String,
    pub stack: String,
}

impl TraceEvent {
    /// Build an event with each field truncated to its bound and scrubbed
    /// of control characters.
    pub fn bounded(name: &str, profile: &str, stack: &str) -> Self {
        Self {
            name: sanitize(truncate_chars(name, MAX_NAME_CHARS)),
            profile: sanitize(truncate_chars(profile, MAX_PROFILE_CHARS)),
            stack: sanitize(truncate_chars(stack, MAX_STACK_CHARS)),
        }
    }
}
