//! Host plugin lifecycle surface
//!
//! The host loads the agent as a plugin and drives it through three
//! entries: `on_load` when the plugin itself comes up, `on_all_plugins_ready`
//! once every other plugin has finished loading (the host's notification,
//! consumed exactly once), and `on_unload` on the way out. Activation
//! order matters: the bridge comes up first so the startup configuration
//! exists before any hook can fire, then the install pass runs.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bridge::{self, StartupConfig};
use crate::capture::{TraceSink, Tracer};
use crate::config::AgentConfig;
use crate::filter::FilterEngine;
use crate::manifest::ModuleManifest;
use crate::registry::{install_all, HookRegistry, InstallReport};

/// What the host integration layer provides at activation time.
pub trait HostRuntime {
    /// Root of the host installation; the collector convention path hangs
    /// off it.
    fn install_dir(&self) -> std::path::PathBuf;

    /// Ordered list of loaded modules, fixed at this point. Modules that
    /// appear later are never scanned.
    fn modules(&self) -> Vec<ModuleManifest>;
}

/// The agent as the host sees it.
pub struct CallTracePlugin {
    config: AgentConfig,
    registry: Arc<HookRegistry>,
    activated: bool,
}

impl CallTracePlugin {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            registry: Arc::new(HookRegistry::new()),
            activated: false,
        }
    }

    /// The registration table host wrapper thunks dispatch through.
    pub fn registry(&self) -> Arc<HookRegistry> {
        self.registry.clone()
    }

    /// Host `onLoad` entry. The host registers the all-plugins-ready
    /// notification on our behalf; nothing to do yet.
    pub fn on_load(&self) {
        info!("{} loaded, waiting for plugins", self.config.plugin_name);
    }

    /// The one event the agent consumes: bridge initialization, then the
    /// single install pass. A second invocation is a no-op.
    pub fn on_all_plugins_ready(&mut self, host: &dyn HostRuntime) -> InstallReport {
        if self.activated {
            warn!("all-plugins-ready received twice, ignoring");
            return InstallReport::default();
        }
        self.activated = true;

        let path = self.config.collector_path(&host.install_dir());
        let (sink, startup): (Option<Arc<dyn TraceSink>>, StartupConfig) =
            match bridge::initialize(&path, self.config.wire_format) {
                Ok((bridge, startup)) => (Some(Arc::new(bridge)), startup),
                Err(e) => {
                    warn!("collector unavailable, tracing disabled: {}", e);
                    (None, StartupConfig::default())
                }
            };

        let filter = FilterEngine::new(startup.filters);
        if !filter.is_empty() {
            info!("filter rules received: {}", filter.len());
        }

        let tracer = Arc::new(Tracer::new(
            startup.lightweight,
            filter,
            self.config.wire_format,
            self.config.stack_skip_frames,
            sink,
        ));

        let report = install_all(&host.modules(), &self.config.scan, &self.registry, tracer);
        info!("install summary: {}", report);
        report
    }

    /// Host `onUnload` entry: every installed hook is removed.
    pub fn on_unload(&mut self) {
        self.registry.uninstall_all();
        info!("{} unloaded, hooks removed", self.config.plugin_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{MethodDecl, TypeManifest};
    use std::path::PathBuf;

    struct FakeHost {
        dir: PathBuf,
        modules: Vec<ModuleManifest>,
    }

    impl HostRuntime for FakeHost {
        fn install_dir(&self) -> PathBuf {
            self.dir.clone()
        }

        fn modules(&self) -> Vec<ModuleManifest> {
            self.modules.clone()
        }
    }

    fn host_with_one_module(dir: PathBuf) -> FakeHost {
        FakeHost {
            dir,
            modules: vec![ModuleManifest {
                name: "MyGameMod".to_string(),
                references: vec![AgentConfig::default().scan.target_api],
                types: vec![TypeManifest {
                    namespace: "Gameplay".to_string(),
                    name: "Server".to_string(),
                    base: None,
                    methods: vec![MethodDecl::named("Tick")],
                }],
            }],
        }
    }

    #[test]
    fn test_activation_without_collector_still_installs() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_one_module(dir.path().to_path_buf());
        let mut plugin = CallTracePlugin::new(AgentConfig::default());

        plugin.on_load();
        let report = plugin.on_all_plugins_ready(&host);
        assert_eq!(report.installed, 1);
        assert!(plugin.registry().is_installed("Gameplay.Server::Tick"));
    }

    #[test]
    fn test_second_ready_event_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_one_module(dir.path().to_path_buf());
        let mut plugin = CallTracePlugin::new(AgentConfig::default());

        let first = plugin.on_all_plugins_ready(&host);
        let second = plugin.on_all_plugins_ready(&host);
        assert_eq!(first.installed, 1);
        assert_eq!(second, InstallReport::default());
        assert_eq!(plugin.registry().installed_count(), 1);
    }

    #[test]
    fn test_unload_removes_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_one_module(dir.path().to_path_buf());
        let mut plugin = CallTracePlugin::new(AgentConfig::default());

        plugin.on_all_plugins_ready(&host);
        assert_eq!(plugin.registry().installed_count(), 1);

        plugin.on_unload();
        assert_eq!(plugin.registry().installed_count(), 0);
    }
}
