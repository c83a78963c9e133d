//! Host-declared instrumentation manifest
//!
//! A native-code agent cannot reflect over the host's plugin modules at
//! runtime, so the host integration layer hands the agent an explicit,
//! ordered description of every loaded module at activation time: which
//! modules exist, what they reference, and which methods each type
//! declares. The manifest is data (serde-friendly) so a host can generate
//! it at build time and ship it alongside the plugin.
//!
//! Modules loaded after activation are never seen; there is no hot-reload
//! pass.

use serde::{Deserialize, Serialize};

/// One loaded code module as the host saw it when all plugins finished
/// loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,

    /// Names of modules this one declares references to; used to decide
    /// whether it touches the target API surface at all.
    #[serde(default)]
    pub references: Vec<String>,

    #[serde(default)]
    pub types: Vec<TypeManifest>,
}

/// A type within a module, with the methods it declares itself.
///
/// Inherited methods are not repeated here; the install pass walks the
/// `base` chain across all supplied modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeManifest {
    #[serde(default)]
    pub namespace: String,
    pub name: String,

    /// Qualified name of the ancestor type, if any.
    #[serde(default)]
    pub base: Option<String>,

    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl TypeManifest {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A declared method and the static facts the install pass filters on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,

    /// Declared parameter type names, in order.
    #[serde(default)]
    pub param_types: Vec<String>,

    #[serde(default)]
    pub is_static: bool,

    #[serde(default)]
    pub is_abstract: bool,

    #[serde(default)]
    pub is_constructor: bool,

    #[serde(default)]
    pub is_generic: bool,

    /// Compiler-emitted special methods (operators, accessors backing).
    #[serde(default)]
    pub is_special_name: bool,

    /// False for externally-implemented or security-restricted bodies the
    /// host cannot wrap.
    #[serde(default = "default_interceptable")]
    pub interceptable: bool,
}

fn default_interceptable() -> bool {
    true
}

impl Default for MethodDecl {
    fn default() -> Self {
        Self {
            name: String::new(),
            param_types: Vec::new(),
            is_static: false,
            is_abstract: false,
            is_constructor: false,
            is_generic: false,
            is_special_name: false,
            interceptable: true,
        }
    }
}

impl MethodDecl {
    /// A plain instance method with the given name, hookable by default.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Stable identity of a hooked method: declaring type plus method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId {
    pub declaring_type: String,
    pub name: String,
}

impl MethodId {
    pub fn new(declaring_type: &str, name: &str) -> Self {
        Self {
            declaring_type: declaring_type.to_string(),
            name: name.to_string(),
        }
    }

    /// The key used for filtering, dispatch, and reporting.
    pub fn qualified(&self) -> String {
        format!("{}::{}", self.declaring_type, self.name)
    }
}

impl std::fmt::Display for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_type_name() {
        let ty = TypeManifest {
            namespace: "Gameplay.Core".to_string(),
            name: "Server".to_string(),
            base: None,
            methods: vec![],
        };
        assert_eq!(ty.qualified_name(), "Gameplay.Core.Server");

        let global = TypeManifest {
            namespace: String::new(),
            name: "Bootstrap".to_string(),
            base: None,
            methods: vec![],
        };
        assert_eq!(global.qualified_name(), "Bootstrap");
    }

    #[test]
    fn test_method_id_qualified() {
        let id = MethodId::new("Gameplay.Core.Server", "Tick");
        assert_eq!(id.qualified(), "Gameplay.Core.Server::Tick");
        assert_eq!(id.to_string(), id.qualified());
    }

    #[test]
    fn test_method_decl_defaults_interceptable() {
        let decl = MethodDecl::named("Spawn");
        assert!(decl.interceptable);
        assert!(!decl.is_abstract);

        // serde default must agree with Default
        let parsed: MethodDecl = serde_json::from_str(r#"{"name":"Spawn"}"#).unwrap();
        assert!(parsed.interceptable);
    }
}
