//! Native collector bridge
//!
//! Loads the collector library shipped alongside the agent, calls its
//! startup export to fetch the runtime configuration (lightweight flag and
//! filter rules), and resolves the trace sink matching the configured wire
//! format. Load or resolution failure makes the bridge permanently inert
//! for this process: the agent still installs its hooks, it just has
//! nowhere to send.

use std::ffi::{CStr, CString};
use std::path::{Path, PathBuf};

use libc::{c_char, c_int};
use libloading::Library;
use thiserror::Error;
use tracing::{debug, info};

use callwire_shared::{WireFormat, WirePayload};

use crate::capture::TraceSink;

pub const STARTUP_SYMBOL: &[u8] = b"CollectorStartup";
pub const BINARY_SINK_SYMBOL: &[u8] = b"CollectorTraceBinary";
pub const TEXT_SINK_SYMBOL: &[u8] = b"CollectorTraceText";

/// Why the collector could not be brought up. Terminal for the process
/// run; there is no retry path.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("collector library not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to load collector library: {0}")]
    Library(#[from] libloading::Error),

    #[error("collector export `{name}` missing: {source}")]
    MissingSymbol {
        name: &'static str,
        source: libloading::Error,
    },
}

/// Startup configuration handed over by the collector, fixed for the
/// process lifetime before any hook fires.
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub lightweight: bool,
    pub filters: Vec<String>,
}

/// C-ABI mirror of the collector's startup export return value.
#[repr(C)]
struct RawStartupConfig {
    lightweight: u8,
    /// Optional comma-separated filter list; may be null.
    filters: *const c_char,
}

type StartupFn = unsafe extern "C" fn() -> RawStartupConfig;
type BinarySinkFn = unsafe extern "C" fn(*const u8, c_int);
type TextSinkFn = unsafe extern "C" fn(*const c_char);

enum Sink {
    Binary(BinarySinkFn),
    Text(TextSinkFn),
}

/// Owner of the loaded collector and its resolved trace sink.
pub struct NativeBridge {
    sink: Sink,
    // Keeps the resolved function pointers valid for the bridge lifetime.
    _lib: Library,
}

/// Load the collector, fetch its startup configuration, and resolve the
/// sink for `format`.
pub fn initialize(
    path: &Path,
    format: WireFormat,
) -> Result<(NativeBridge, StartupConfig), LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    // Safety: the collector is a trusted component installed alongside the
    // agent; its exports follow the fixed C ABI declared above.
    let lib = unsafe { Library::new(path) }?;

    let startup = unsafe { lib.get::<StartupFn>(STARTUP_SYMBOL) }.map_err(|source| {
        LoadError::MissingSymbol {
            name: "CollectorStartup",
            source,
        }
    })?;
    let raw = unsafe { startup() };
    let config = StartupConfig {
        lightweight: raw.lightweight != 0,
        filters: parse_filters(raw.filters),
    };

    let sink = match format {
        WireFormat::Binary => {
            let f = unsafe { lib.get::<BinarySinkFn>(BINARY_SINK_SYMBOL) }.map_err(|source| {
                LoadError::MissingSymbol {
                    name: "CollectorTraceBinary",
                    source,
                }
            })?;
            Sink::Binary(*f)
        }
        WireFormat::Text => {
            let f = unsafe { lib.get::<TextSinkFn>(TEXT_SINK_SYMBOL) }.map_err(|source| {
                LoadError::MissingSymbol {
                    name: "CollectorTraceText",
                    source,
                }
            })?;
            Sink::Text(*f)
        }
    };

    info!(
        "collector loaded from {} (lightweight={}, {} filter rules)",
        path.display(),
        config.lightweight,
        config.filters.len()
    );

    Ok((NativeBridge { sink, _lib: lib }, config))
}

/// Split a comma-separated filter list, trimming entries and dropping
/// empty ones. A null pointer means no filters.
fn parse_filters(ptr: *const c_char) -> Vec<String> {
    if ptr.is_null() {
        return Vec::new();
    }
    // Safety: the collector guarantees a NUL-terminated string that
    // outlives the startup call.
    let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy();
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl NativeBridge {
    /// Forward one encoded message. Runs on the traced call path, so it
    /// must never raise back into the caller.
    pub fn send(&self, payload: &WirePayload) {
        match (&self.sink, payload) {
            (Sink::Binary(f), WirePayload::Binary(bytes)) => {
                // Safety: the sink copies out of the buffer before
                // returning; pointer and length describe a live Vec.
                unsafe { f(bytes.as_ptr(), bytes.len() as c_int) }
            }
            (Sink::Text(f), WirePayload::Text(s)) => {
                // Sanitized text cannot contain an interior NUL; if it
                // somehow does, drop the message rather than truncate it.
                if let Ok(text) = CString::new(s.as_str()) {
                    // Safety: as above; the CString lives across the call.
                    unsafe { f(text.as_ptr()) }
                }
            }
            // A payload of the wrong format never reaches a resolved sink.
            _ => debug!("dropping payload that does not match the resolved sink"),
        }
    }
}

impl TraceSink for NativeBridge {
    fn send(&self, payload: &WirePayload) {
        NativeBridge::send(self, payload);
    }
}
