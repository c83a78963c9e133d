//! Agent configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use callwire_shared::WireFormat;

/// Conventional location of the collector library under the host install
/// directory.
pub const COLLECTOR_RELATIVE_PATH: &str = "addons/callwire/bin/libcallwire_collector.so";

/// Deployment configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name the agent registers under with the host; also identifies the
    /// agent's own module during the install scan.
    pub plugin_name: String,

    /// Wire encoding used toward the collector.
    pub wire_format: WireFormat,

    /// Absolute collector path override. `None` uses the convention path
    /// under the host install directory.
    pub collector_path: Option<PathBuf>,

    /// Frames dropped from the top of a captured stack so the first
    /// reported frame is the hooked call site, not the hook machinery.
    pub stack_skip_frames: usize,

    /// Static eligibility rules for the install pass.
    pub scan: ScanRules,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let wire_format = std::env::var("CALLWIRE_WIRE_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self {
            plugin_name: "Callwire".to_string(),
            wire_format,
            collector_path: std::env::var("CALLWIRE_COLLECTOR_PATH").ok().map(PathBuf::from),
            stack_skip_frames: std::env::var("CALLWIRE_STACK_SKIP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            scan: ScanRules::default(),
        }
    }
}

impl AgentConfig {
    /// Resolve the collector library path for a given host install dir.
    pub fn collector_path(&self, install_dir: &Path) -> PathBuf {
        self.collector_path
            .clone()
            .unwrap_or_else(|| install_dir.join(COLLECTOR_RELATIVE_PATH))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.plugin_name.trim().is_empty() {
            return Err("plugin name must not be empty".to_string());
        }
        if self.scan.target_api.trim().is_empty() {
            return Err("target API surface must not be empty".to_string());
        }
        Ok(())
    }
}

/// Static eligibility rules applied while walking the method manifest.
///
/// Defaults match the surface the agent was built for: a CounterStrikeSharp
/// plugin host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRules {
    /// The agent's own module name; never scanned.
    pub own_module: String,

    /// Module/namespace prefixes owned by the runtime or framework.
    pub reserved_prefixes: Vec<String>,

    /// A module is only scanned if it references this API surface.
    pub target_api: String,

    /// Methods declared on this type are skipped (the plugin base class
    /// every host plugin derives from).
    pub base_plugin_type: String,

    /// Opaque handle types; a method whose single parameter is one of
    /// these is unsafe to stringify and is skipped.
    pub raw_pointer_types: Vec<String>,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            own_module: "Callwire".to_string(),
            reserved_prefixes: vec!["System".to_string(), "Microsoft".to_string()],
            target_api: "CounterStrikeSharp.API".to_string(),
            base_plugin_type: "CounterStrikeSharp.API.Core.BasePlugin".to_string(),
            raw_pointer_types: vec!["IntPtr".to_string(), "UIntPtr".to_string()],
        }
    }
}

impl ScanRules {
    /// Module identities are compared case-insensitively.
    pub fn is_reserved_module(&self, name: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|p| name.get(..p.len()).is_some_and(|head| head.eq_ignore_ascii_case(p)))
    }

    /// Namespaces are case-sensitive.
    pub fn is_reserved_namespace(&self, namespace: &str) -> bool {
        self.reserved_prefixes.iter().any(|p| namespace.starts_with(p.as_str()))
    }

    pub fn references_target_api(&self, references: &[String]) -> bool {
        references.iter().any(|r| r.eq_ignore_ascii_case(&self.target_api))
    }

    pub fn is_raw_pointer_type(&self, type_name: &str) -> bool {
        type_name.ends_with('*')
            || self.raw_pointer_types.iter().any(|t| t == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_path_convention() {
        let config = AgentConfig {
            collector_path: None,
            ..Default::default()
        };
        let path = config.collector_path(Path::new("/srv/game"));
        assert_eq!(
            path,
            Path::new("/srv/game/addons/callwire/bin/libcallwire_collector.so")
        );
    }

    #[test]
    fn test_collector_path_override() {
        let config = AgentConfig {
            collector_path: Some(PathBuf::from("/opt/collector.so")),
            ..Default::default()
        };
        assert_eq!(
            config.collector_path(Path::new("/srv/game")),
            Path::new("/opt/collector.so")
        );
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let mut config = AgentConfig::default();
        assert!(config.validate().is_ok());

        config.plugin_name = "  ".to_string();
        assert!(config.validate().is_err());

        config.plugin_name = "Callwire".to_string();
        config.scan.target_api = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reserved_module_ignores_case() {
        let rules = ScanRules::default();
        assert!(rules.is_reserved_module("System.Runtime"));
        assert!(rules.is_reserved_module("system.runtime"));
        assert!(rules.is_reserved_module("MICROSOFT.Extensions"));
        assert!(!rules.is_reserved_module("MyPlugin"));
    }

    #[test]
    fn test_reserved_namespace_is_case_sensitive() {
        let rules = ScanRules::default();
        assert!(rules.is_reserved_namespace("System.Collections"));
        assert!(!rules.is_reserved_namespace("system.Collections"));
        assert!(!rules.is_reserved_namespace("Gameplay"));
    }

    #[test]
    fn test_raw_pointer_types() {
        let rules = ScanRules::default();
        assert!(rules.is_raw_pointer_type("IntPtr"));
        assert!(rules.is_raw_pointer_type("UIntPtr"));
        assert!(rules.is_raw_pointer_type("CEntityInstance*"));
        assert!(!rules.is_raw_pointer_type("String"));
    }

    #[test]
    fn test_references_target_api() {
        let rules = ScanRules::default();
        let refs = vec![
            "System.Linq".to_string(),
            "counterstrikesharp.api".to_string(),
        ];
        assert!(rules.references_target_api(&refs));
        assert!(!rules.references_target_api(&["System.Linq".to_string()]));
    }
}
