//! Method discovery and hook installation
//!
//! A single forward pass over the host manifest: eligible modules are
//! walked type by type (including each type's ancestor chain), static
//! exclusion rules weed out what must never be hooked, and everything
//! left is entered into the hook registry. The pass runs once per
//! process; modules loaded later are never revisited.
//!
//! The registry itself is the registration table the host's wrapper
//! thunks dispatch through: qualified method name -> installed observer.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use crate::capture::{CallArg, CallObserver, Proceed};
use crate::config::ScanRules;
use crate::manifest::{MethodDecl, MethodId, ModuleManifest, TypeManifest};

/// Why a specific method could not be hooked.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("method `{0}` has no interceptable body")]
    NotInterceptable(String),

    #[error("hook already installed for `{0}`")]
    AlreadyInstalled(String),
}

struct InstalledHook {
    id: MethodId,
    observer: Arc<dyn CallObserver>,
}

/// Registration table mapping qualified method names to observers.
///
/// Written during the single-threaded install pass (and emptied on
/// unload); read concurrently by every thread executing wrapped calls.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, InstalledHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a pre-call observer to `method`. At most one hook per
    /// method per process lifetime.
    pub fn install(
        &self,
        id: MethodId,
        decl: &MethodDecl,
        observer: Arc<dyn CallObserver>,
    ) -> Result<(), InstallError> {
        if !decl.interceptable {
            return Err(InstallError::NotInterceptable(id.qualified()));
        }

        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        let key = id.qualified();
        if hooks.contains_key(&key) {
            return Err(InstallError::AlreadyInstalled(key));
        }
        hooks.insert(key, InstalledHook { id, observer });
        Ok(())
    }

    /// Entry point for host wrapper thunks, invoked before the original
    /// method body. Unhooked names are a no-op. Always proceeds.
    pub fn on_call(
        &self,
        qualified: &str,
        receiver: Option<&dyn fmt::Display>,
        args: &[CallArg<'_>],
    ) -> Proceed {
        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        if let Some(hook) = hooks.get(qualified) {
            return hook.observer.on_enter(&hook.id, receiver, args);
        }
        Proceed
    }

    pub fn is_installed(&self, qualified: &str) -> bool {
        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        hooks.contains_key(qualified)
    }

    pub fn installed_count(&self) -> usize {
        let hooks = self.hooks.read().unwrap_or_else(|e| e.into_inner());
        hooks.len()
    }

    /// Remove every installed hook (host unload contract).
    pub fn uninstall_all(&self) {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        hooks.clear();
    }
}

/// Outcome counters for one install pass. Diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub modules: usize,
    pub types: usize,
    pub methods: usize,
    pub installed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "modules={}, types={}, methods={}, installed={}, skipped={}, failed={}",
            self.modules, self.types, self.methods, self.installed, self.skipped, self.failed
        )
    }
}

/// Walk the manifest once and install `observer` on every eligible method.
pub fn install_all(
    modules: &[ModuleManifest],
    rules: &ScanRules,
    registry: &HookRegistry,
    observer: Arc<dyn CallObserver>,
) -> InstallReport {
    // Ancestor chains may cross modules, so index every supplied type.
    let type_index: HashMap<String, &TypeManifest> = modules
        .iter()
        .flat_map(|m| &m.types)
        .map(|t| (t.qualified_name(), t))
        .collect();

    let mut report = InstallReport::default();

    for module in modules {
        if !module_eligible(module, rules) {
            continue;
        }
        report.modules += 1;
        debug!("scanning module {}", module.name);

        for ty in &module.types {
            if rules.is_reserved_namespace(&ty.namespace) {
                continue;
            }
            report.types += 1;

            let mut visited = HashSet::new();
            let mut current = Some(ty);
            while let Some(t) = current {
                if !visited.insert(t.qualified_name()) {
                    break; // base cycle in a malformed manifest
                }

                for method in &t.methods {
                    report.methods += 1;

                    if statically_skipped(t, method, rules) {
                        report.skipped += 1;
                        continue;
                    }

                    let id = MethodId::new(&t.qualified_name(), &method.name);
                    match registry.install(id, method, observer.clone()) {
                        Ok(()) => report.installed += 1,
                        // An ancestor shared by several types is reached
                        // once per derived type; only the first visit
                        // installs.
                        Err(InstallError::AlreadyInstalled(_)) => report.skipped += 1,
                        Err(e) => {
                            report.failed += 1;
                            warn!("hook installation failed: {}", e);
                        }
                    }
                }

                current = t
                    .base
                    .as_deref()
                    .and_then(|base| type_index.get(base).copied());
            }
        }
    }

    report
}

fn module_eligible(module: &ModuleManifest, rules: &ScanRules) -> bool {
    if module.name == rules.own_module {
        return false;
    }
    if rules.is_reserved_module(&module.name) {
        return false;
    }
    rules.references_target_api(&module.references)
}

fn statically_skipped(ty: &TypeManifest, method: &MethodDecl, rules: &ScanRules) -> bool {
    if method.is_abstract || method.is_constructor || method.is_generic {
        return true;
    }
    // Property accessors.
    if method.name.starts_with("get_") || method.name.starts_with("set_") {
        return true;
    }
    // Hooking dispatch or delegate invocation would recurse through the
    // hook machinery itself.
    if method.name.contains("Invoke") {
        return true;
    }
    if method.is_special_name {
        return true;
    }
    // Ancestors may sit in framework namespaces even when the scanned
    // type does not.
    if rules.is_reserved_namespace(&ty.namespace) {
        return true;
    }
    if ty.qualified_name() == rules.base_plugin_type {
        return true;
    }
    // A lone opaque-handle parameter is unsafe to stringify.
    if method.param_types.len() == 1 && rules.is_raw_pointer_type(&method.param_types[0]) {
        return true;
    }
    false
}
