//! Simulated host driving the trace pipeline
//!
//! Builds a small module manifest the way a host integration layer would,
//! wires a tracer whose sink prints decoded events instead of crossing
//! into a native collector, runs the install pass, and dispatches a few
//! calls through the registry.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use callwire_agent::capture::{CallArg, TraceSink, Tracer};
use callwire_agent::config::ScanRules;
use callwire_agent::filter::FilterEngine;
use callwire_agent::manifest::{MethodDecl, ModuleManifest, TypeManifest};
use callwire_agent::registry::{install_all, HookRegistry};
use callwire_shared::{WireFormat, WirePayload};

/// Sink that decodes each payload and logs it.
struct PrintSink {
    format: WireFormat,
}

impl TraceSink for PrintSink {
    fn send(&self, payload: &WirePayload) {
        match self.format.decode(payload) {
            Ok(event) => info!(
                "trace: {} | args: [{}] | {} wire bytes",
                event.name,
                event.profile,
                payload.len()
            ),
            Err(e) => info!("undecodable payload: {}", e),
        }
    }
}

fn demo_modules(rules: &ScanRules) -> Vec<ModuleManifest> {
    vec![
        ModuleManifest {
            name: "DeathmatchMod".to_string(),
            references: vec![rules.target_api.clone()],
            types: vec![
                TypeManifest {
                    namespace: "Deathmatch".to_string(),
                    name: "RoundManager".to_string(),
                    base: None,
                    methods: vec![
                        MethodDecl::named("StartRound"),
                        MethodDecl::named("EndRound"),
                        MethodDecl::named("OnTickUpdate"),
                        MethodDecl::named("get_RoundCount"),
                    ],
                },
                TypeManifest {
                    namespace: "Deathmatch".to_string(),
                    name: "PlayerTracker".to_string(),
                    base: None,
                    methods: vec![
                        MethodDecl::named("RecordKill"),
                        MethodDecl::named("InvokeScoreboard"),
                    ],
                },
            ],
        },
        // Never scanned: no reference to the target API surface.
        ModuleManifest {
            name: "UnrelatedUtility".to_string(),
            references: vec!["System.Text.Json".to_string()],
            types: vec![],
        },
    ]
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let format = WireFormat::Binary;
    let rules = ScanRules::default();

    // Filters would normally come from the collector's startup config.
    let filter = FilterEngine::new(["OnTick".to_string()]);
    let tracer = Arc::new(Tracer::new(
        false,
        filter,
        format,
        2,
        Some(Arc::new(PrintSink { format }) as Arc<dyn TraceSink>),
    ));

    let registry = HookRegistry::new();
    let report = install_all(&demo_modules(&rules), &rules, &registry, tracer);
    info!("install summary: {}", report);

    // The host's wrapper thunks would make these dispatches before each
    // original call.
    registry.on_call(
        "Deathmatch.RoundManager::StartRound",
        None,
        &[CallArg::Value(&"de_dust2"), CallArg::Value(&10)],
    );
    registry.on_call(
        "Deathmatch.PlayerTracker::RecordKill",
        None,
        &[CallArg::Value(&"attacker#3"), CallArg::Value(&"victim#7"), CallArg::Null],
    );
    // Suppressed by the filter rule.
    registry.on_call("Deathmatch.RoundManager::OnTickUpdate", None, &[]);
    // Never hooked (property accessor), so a no-op.
    registry.on_call("Deathmatch.RoundManager::get_RoundCount", None, &[]);

    registry.uninstall_all();
    info!("hooks removed, demo done");
    Ok(())
}
