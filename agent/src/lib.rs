//! In-process call-trace agent
//!
//! The agent lives inside a game-server plugin host. At activation it loads
//! the native collector library, fetches its startup configuration, walks
//! the host-supplied method manifest, and installs a pre-call observer on
//! every eligible method. Each call to a hooked method is captured inline
//! on the calling thread, encoded, and forwarded to the collector; the
//! original call always runs unmodified.

pub mod bridge;
pub mod capture;
pub mod config;
pub mod filter;
pub mod manifest;
pub mod plugin;
pub mod registry;

pub use config::{AgentConfig, ScanRules};
pub use plugin::{CallTracePlugin, HostRuntime};
pub use registry::{HookRegistry, InstallReport};
