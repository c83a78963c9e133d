//! Trace capture: the hook body
//!
//! `Tracer` is the observer installed on every hooked method. It runs
//! inline on whichever thread made the call: filter check, optional
//! profile/stack text, encode, hand to the sink, and return control. The
//! whole body sits behind a panic boundary; nothing the capture does can
//! alter or abort the original call.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use backtrace::Backtrace;
use tracing::debug;

use callwire_shared::types::event::MAX_NAME_CHARS;
use callwire_shared::utils::sanitize::truncate_chars;
use callwire_shared::{TraceEvent, WireFormat, WirePayload, LIGHTWEIGHT_SENTINEL};

use crate::filter::FilterEngine;
use crate::manifest::MethodId;

/// Marker returned by every observer: the original call always runs. There
/// is no other variant to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proceed;

/// One call argument as presented to the observer.
pub enum CallArg<'a> {
    Value(&'a dyn fmt::Display),
    Null,
}

/// Pre-call observer seam. An implementation observes the call and must
/// not suppress, redirect, or rewrite it.
pub trait CallObserver: Send + Sync {
    fn on_enter(
        &self,
        method: &MethodId,
        receiver: Option<&dyn fmt::Display>,
        args: &[CallArg<'_>],
    ) -> Proceed;
}

/// Transport seam between capture and the collector.
pub trait TraceSink: Send + Sync {
    fn send(&self, payload: &WirePayload);
}

/// The capture pipeline, built once at activation and shared immutably
/// across calling threads.
pub struct Tracer {
    lightweight: bool,
    filter: FilterEngine,
    format: WireFormat,
    skip_frames: usize,
    sink: Option<Arc<dyn TraceSink>>,
}

impl Tracer {
    pub fn new(
        lightweight: bool,
        filter: FilterEngine,
        format: WireFormat,
        skip_frames: usize,
        sink: Option<Arc<dyn TraceSink>>,
    ) -> Self {
        Self {
            lightweight,
            filter,
            format,
            skip_frames,
            sink,
        }
    }

    fn capture(&self, method: &MethodId, args: &[CallArg<'_>]) {
        let qualified = method.qualified();
        let name = truncate_chars(&qualified, MAX_NAME_CHARS);

        if self.filter.suppresses(name) {
            return;
        }

        // Inert bridge: skip the expensive text work too, nothing to send.
        let Some(sink) = &self.sink else {
            return;
        };

        let (profile, stack) = if self.lightweight {
            (LIGHTWEIGHT_SENTINEL.to_string(), LIGHTWEIGHT_SENTINEL.to_string())
        } else {
            (build_profile(args), capture_stack(self.skip_frames))
        };

        let event = TraceEvent::bounded(name, &profile, &stack);
        match self.format.encode(&event) {
            Ok(payload) => sink.send(&payload),
            // Bounded fields cannot overflow the frame; anything else here
            // is a capture failure and is dropped like one.
            Err(e) => debug!("encode failed for {}: {}", event.name, e),
        }
    }
}

impl CallObserver for Tracer {
    fn on_enter(
        &self,
        method: &MethodId,
        _receiver: Option<&dyn fmt::Display>,
        args: &[CallArg<'_>],
    ) -> Proceed {
        // The traced call path must never observe a panic from in here.
        let _ = catch_unwind(AssertUnwindSafe(|| self.capture(method, args)));
        Proceed
    }
}

fn build_profile(args: &[CallArg<'_>]) -> String {
    args.iter().map(stringify).collect::<Vec<_>>().join(", ")
}

/// Render one argument, degrading to `"[error]"` when its `Display`
/// implementation panics.
fn stringify(arg: &CallArg<'_>) -> String {
    match arg {
        CallArg::Null => "null".to_string(),
        CallArg::Value(value) => catch_unwind(AssertUnwindSafe(|| value.to_string()))
            .unwrap_or_else(|_| "[error]".to_string()),
    }
}

/// Capture the current call stack, dropping `skip` frames of hook
/// machinery so the first reported frame is the hooked call site.
fn capture_stack(skip: usize) -> String {
    let backtrace = Backtrace::new();
    let mut frames = Vec::new();
    for frame in backtrace.frames().iter().skip(skip) {
        for symbol in frame.symbols() {
            let name = symbol
                .name()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => {
                    frames.push(format!("at {} ({}:{})", name, file.display(), line));
                }
                _ => frames.push(format!("at {name}")),
            }
        }
    }
    frames.join(" | ")
}
