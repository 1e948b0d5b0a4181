//! The entry callback handler.
//!
//! This is the handler bound under [`PLUGIN_ENTRY_HOOK`] that injected
//! bundles invoke to complete registration. It executes inside a callback
//! boundary with no awaiting caller, so every failure here is absorbed and
//! logged rather than propagated; the worst outcome is a plugin that stays
//! registered but inert.
//!
//! [`PLUGIN_ENTRY_HOOK`]: crate::hook::PLUGIN_ENTRY_HOOK

use std::sync::Arc;

use tracing::{error, info, warn};

use atrium_core::{CodeRefResolver, ExtensionStore, PluginId, PluginModule, SharedModuleInit};

use crate::hook::PluginEntryHook;
use crate::registry::PendingPluginRegistry;

/// Completes a plugin's registration when its bundle calls back.
///
/// Constructed by binding its three collaborators — the extension store, the
/// shared-module initializer, and the code-reference resolver — so each can
/// be substituted in tests.
pub struct EntryCallbackHandler {
    registry: Arc<PendingPluginRegistry>,
    store: Arc<dyn ExtensionStore>,
    shared_init: Arc<dyn SharedModuleInit>,
    code_refs: Arc<dyn CodeRefResolver>,
}

impl EntryCallbackHandler {
    /// Bind the handler's collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<PendingPluginRegistry>,
        store: Arc<dyn ExtensionStore>,
        shared_init: Arc<dyn SharedModuleInit>,
        code_refs: Arc<dyn CodeRefResolver>,
    ) -> Self {
        Self {
            registry,
            store,
            shared_init,
            code_refs,
        }
    }
}

impl PluginEntryHook for EntryCallbackHandler {
    fn on_plugin_entry(&self, plugin_id: &PluginId, module: Arc<dyn PluginModule>) {
        // Stray or malicious callbacks for unknown plugins are ignored.
        let Some(snapshot) = self.registry.get(plugin_id) else {
            warn!(plugin_id = %plugin_id, "Entry callback for unknown plugin; ignoring");
            return;
        };

        // Flip the flag before running anything else: a reentrant callback
        // for the same id lands in the Some(true) arm even while the rest
        // of this function is still running.
        match self.registry.mark_entry_callback_fired(plugin_id) {
            Some(false) => {},
            Some(true) => {
                warn!(plugin_id = %plugin_id, "Duplicate entry callback; ignoring");
                return;
            },
            None => {
                warn!(plugin_id = %plugin_id, "Entry callback raced a reset; ignoring");
                return;
            },
        }

        if let Err(e) = self.shared_init.initialize(module.as_ref()) {
            error!(
                plugin_id = %plugin_id,
                error = %e,
                "Shared scope initialization failed; plugin stays registered but inert"
            );
            return;
        }

        let resolved = self.code_refs.resolve(
            &snapshot.manifest.extensions,
            module.as_ref(),
            plugin_id,
            &|reference| {
                warn!(plugin_id = %plugin_id, reference, "Unresolved code reference; dropping property");
            },
        );

        self.store
            .add_dynamic_plugin(plugin_id, &snapshot.manifest, resolved);
        info!(plugin_id = %plugin_id, "Plugin extensions registered");
    }
}

impl std::fmt::Debug for EntryCallbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCallbackHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::{
        DefaultCodeRefResolver, ExportHandle, ExtensionDeclaration, PluginManifest, PluginName,
        ResolvedExtension, SharedScopeError,
    };
    use serde_json::json;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use url::Url;

    #[derive(Default)]
    struct RecordingStore {
        added: Mutex<Vec<(PluginId, Vec<ResolvedExtension>)>>,
    }

    impl ExtensionStore for RecordingStore {
        fn add_dynamic_plugin(
            &self,
            plugin_id: &PluginId,
            _manifest: &PluginManifest,
            extensions: Vec<ResolvedExtension>,
        ) {
            self.added
                .lock()
                .unwrap()
                .push((plugin_id.clone(), extensions));
        }

        fn set_dynamic_plugin_enabled(&self, _plugin_id: &PluginId, _enabled: bool) {}

        fn allowed_plugin_names(&self) -> HashSet<String> {
            HashSet::new()
        }
    }

    struct StubInit {
        failure: Option<String>,
        calls: Mutex<usize>,
    }

    impl StubInit {
        fn ok() -> Self {
            Self {
                failure: None,
                calls: Mutex::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl SharedModuleInit for StubInit {
        fn initialize(&self, _module: &dyn PluginModule) -> Result<(), SharedScopeError> {
            let mut calls = self.calls.lock().unwrap();
            *calls = calls.saturating_add(1);
            drop(calls);
            match &self.failure {
                Some(message) => Err(SharedScopeError(message.clone())),
                None => Ok(()),
            }
        }
    }

    struct MapModule(HashMap<String, ExportHandle>);

    impl PluginModule for MapModule {
        fn export(&self, name: &str) -> Option<ExportHandle> {
            self.0.get(name).cloned()
        }
    }

    fn manifest_with_ref(name: &str) -> PluginManifest {
        PluginManifest {
            name: PluginName::from_static(name),
            version: "1.0.0".to_string(),
            display_name: None,
            description: None,
            base_url: Url::parse(&format!("https://plugins.example.com/{name}/")).unwrap(),
            requirements: vec![],
            extensions: vec![ExtensionDeclaration {
                kind: "console.nav/item".into(),
                properties: json!({ "component": { "$codeRef": "NavItem" } })
                    .as_object()
                    .unwrap()
                    .clone(),
            }],
        }
    }

    fn handler(
        registry: &Arc<PendingPluginRegistry>,
        store: &Arc<RecordingStore>,
        init: &Arc<StubInit>,
    ) -> EntryCallbackHandler {
        EntryCallbackHandler::new(
            Arc::clone(registry),
            Arc::clone(store) as Arc<dyn ExtensionStore>,
            Arc::clone(init) as Arc<dyn SharedModuleInit>,
            Arc::new(DefaultCodeRefResolver),
        )
    }

    fn module_with_nav_item() -> Arc<dyn PluginModule> {
        Arc::new(MapModule(HashMap::from([(
            "NavItem".to_string(),
            Arc::new(1_u8) as ExportHandle,
        )])))
    }

    #[test]
    fn test_unknown_plugin_is_noop() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let store = Arc::new(RecordingStore::default());
        let init = Arc::new(StubInit::ok());
        let handler = handler(&registry, &store, &init);

        let id: PluginId = "ghost@1.0.0".parse().unwrap();
        handler.on_plugin_entry(&id, module_with_nav_item());

        assert!(store.added.lock().unwrap().is_empty());
        assert_eq!(init.call_count(), 0);
    }

    #[test]
    fn test_successful_registration() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let store = Arc::new(RecordingStore::default());
        let init = Arc::new(StubInit::ok());
        let handler = handler(&registry, &store, &init);

        let manifest = manifest_with_ref("alpha");
        let id = PluginId::from_manifest(&manifest);
        registry.begin(&id, &manifest).unwrap();

        handler.on_plugin_entry(&id, module_with_nav_item());

        assert!(registry.get(&id).unwrap().entry_callback_fired);
        let added = store.added.lock().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].0, id);
        assert!(added[0].1[0].properties["component"].as_code().is_some());
    }

    #[test]
    fn test_second_callback_is_noop() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let store = Arc::new(RecordingStore::default());
        let init = Arc::new(StubInit::ok());
        let handler = handler(&registry, &store, &init);

        let manifest = manifest_with_ref("alpha");
        let id = PluginId::from_manifest(&manifest);
        registry.begin(&id, &manifest).unwrap();

        handler.on_plugin_entry(&id, module_with_nav_item());
        handler.on_plugin_entry(&id, module_with_nav_item());

        // Only the first invocation reaches the initializer and the store.
        assert_eq!(init.call_count(), 1);
        assert_eq!(store.added.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_shared_init_failure_leaves_plugin_inert() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let store = Arc::new(RecordingStore::default());
        let init = Arc::new(StubInit::failing("scope rejected"));
        let handler = handler(&registry, &store, &init);

        let manifest = manifest_with_ref("alpha");
        let id = PluginId::from_manifest(&manifest);
        registry.begin(&id, &manifest).unwrap();

        handler.on_plugin_entry(&id, module_with_nav_item());

        // The callback fired (injector would resolve), but no extensions
        // were registered.
        assert!(registry.get(&id).unwrap().entry_callback_fired);
        assert!(store.added.lock().unwrap().is_empty());
    }
}
