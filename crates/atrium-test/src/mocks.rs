//! Mock implementations for testing.
//!
//! Uses `std::sync::Mutex` internally so builders work in both sync and
//! async contexts without a runtime.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use atrium_core::{
    ExportHandle, ExtensionStore, PluginId, PluginManifest, PluginModule, ResolvedExtension,
    SharedScope, SharedScopeError,
};
use atrium_plugins::dependencies::{DependencyError, DependencyResolver};
use atrium_plugins::hook::{EntryHookRegistry, PLUGIN_ENTRY_HOOK};
use atrium_plugins::host::{ResourceHost, ScriptElement};
use atrium_plugins::injector::SCRIPT_ELEMENT_PREFIX;
use atrium_plugins::manifest_client::{ManifestClient, ManifestError};
use atrium_plugins::error::ResourceLoadError;

/// What a [`MockResourceHost`] does when a given plugin's script is
/// attached.
enum ScriptedLoad {
    /// Load succeeds and the bundle invokes the entry hook, like a
    /// well-behaved plugin.
    Entry {
        plugin_id: PluginId,
        module: Arc<dyn PluginModule>,
    },
    /// Load succeeds but the bundle never calls back.
    Silent,
    /// Load fails at the transport level.
    Fail(String),
}

/// Mock host surface with scripted per-plugin load outcomes.
///
/// Plays the part of both the document and the injected bundle: on a
/// successful "load" it dispatches the entry hook exactly the way a real
/// bundle's bootstrap code would. Unscripted plugins load silently.
pub struct MockResourceHost {
    hooks: Arc<EntryHookRegistry>,
    attached: Mutex<Vec<ScriptElement>>,
    scripted: Mutex<HashMap<String, ScriptedLoad>>,
}

impl MockResourceHost {
    /// Create a host that dispatches callbacks through `hooks`.
    #[must_use]
    pub fn new(hooks: Arc<EntryHookRegistry>) -> Self {
        Self {
            hooks,
            attached: Mutex::new(Vec::new()),
            scripted: Mutex::new(HashMap::new()),
        }
    }

    fn script(self, name: &str, load: ScriptedLoad) -> Self {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.insert(name.to_string(), load);
        }
        self
    }

    /// Script a well-behaved bundle: load succeeds and the entry hook is
    /// invoked with `plugin_id` and `module`.
    #[must_use]
    pub fn with_entry(self, plugin_id: PluginId, module: Arc<dyn PluginModule>) -> Self {
        let name = plugin_id.name().as_str().to_string();
        self.script(&name, ScriptedLoad::Entry { plugin_id, module })
    }

    /// Script a bundle that loads but never invokes the entry hook.
    #[must_use]
    pub fn with_silent_load(self, name: &str) -> Self {
        self.script(name, ScriptedLoad::Silent)
    }

    /// Script a transport-level load failure.
    #[must_use]
    pub fn with_load_failure(self, name: &str, message: &str) -> Self {
        self.script(name, ScriptedLoad::Fail(message.to_string()))
    }
}

#[async_trait]
impl ResourceHost for MockResourceHost {
    async fn attach_script(&self, element: ScriptElement) -> Result<(), ResourceLoadError> {
        let name = element
            .element_id
            .strip_prefix(SCRIPT_ELEMENT_PREFIX)
            .unwrap_or(&element.element_id)
            .to_string();
        self.attached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(element);

        let scripted = self.scripted.lock().unwrap_or_else(PoisonError::into_inner);
        match scripted.get(&name) {
            Some(ScriptedLoad::Entry { plugin_id, module }) => {
                let plugin_id = plugin_id.clone();
                let module = Arc::clone(module);
                drop(scripted);
                self.hooks.dispatch(PLUGIN_ENTRY_HOOK, &plugin_id, module);
                Ok(())
            },
            Some(ScriptedLoad::Fail(message)) => Err(ResourceLoadError(message.clone())),
            Some(ScriptedLoad::Silent) | None => Ok(()),
        }
    }

    fn remove_scripts_with_prefix(&self, prefix: &str) {
        self.attached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|element| !element.element_id.starts_with(prefix));
    }

    fn attached_scripts(&self) -> Vec<ScriptElement> {
        self.attached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// One recorded extension-store call, for ordering assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `add_dynamic_plugin` was invoked for this plugin.
    AddDynamicPlugin(PluginId),
    /// `set_dynamic_plugin_enabled` was invoked.
    SetEnabled(PluginId, bool),
}

/// In-memory extension store that records every call.
#[derive(Default)]
pub struct InMemoryExtensionStore {
    allowed: HashSet<String>,
    added: Mutex<Vec<(PluginId, PluginManifest, Vec<ResolvedExtension>)>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl InMemoryExtensionStore {
    /// Create a store with an empty allow-list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the allow-list of permitted plugin names.
    #[must_use]
    pub fn with_allowed_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = names.into_iter().map(Into::into).collect();
        self
    }

    /// Every `add_dynamic_plugin` call so far.
    #[must_use]
    pub fn added_plugins(&self) -> Vec<(PluginId, PluginManifest, Vec<ResolvedExtension>)> {
        self.added
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The full call log, in invocation order.
    #[must_use]
    pub fn call_log(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the most recent enablement call for this plugin enabled it.
    #[must_use]
    pub fn is_enabled(&self, plugin_id: &PluginId) -> bool {
        self.call_log()
            .iter()
            .rev()
            .find_map(|call| match call {
                StoreCall::SetEnabled(id, enabled) if id == plugin_id => Some(*enabled),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl ExtensionStore for InMemoryExtensionStore {
    fn add_dynamic_plugin(
        &self,
        plugin_id: &PluginId,
        manifest: &PluginManifest,
        extensions: Vec<ResolvedExtension>,
    ) {
        if let Ok(mut added) = self.added.lock() {
            added.push((plugin_id.clone(), manifest.clone(), extensions));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(StoreCall::AddDynamicPlugin(plugin_id.clone()));
        }
    }

    fn set_dynamic_plugin_enabled(&self, plugin_id: &PluginId, enabled: bool) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(StoreCall::SetEnabled(plugin_id.clone(), enabled));
        }
    }

    fn allowed_plugin_names(&self) -> HashSet<String> {
        self.allowed.clone()
    }
}

/// Manifest client serving canned manifests and failures, no network.
#[derive(Default)]
pub struct StaticManifestClient {
    manifests: HashMap<String, PluginManifest>,
    failures: HashMap<String, String>,
}

impl StaticManifestClient {
    /// Create an empty client; unknown names fail as network errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this manifest for its own name.
    #[must_use]
    pub fn with_manifest(mut self, manifest: PluginManifest) -> Self {
        self.manifests
            .insert(manifest.name.as_str().to_string(), manifest);
        self
    }

    /// Fail fetches for `name` with a network error.
    #[must_use]
    pub fn with_fetch_failure(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }
}

#[async_trait]
impl ManifestClient for StaticManifestClient {
    fn manifest_url(&self, name: &atrium_core::PluginName) -> String {
        format!("https://console.example.com/api/plugins/{name}/")
    }

    async fn fetch(
        &self,
        name: &atrium_core::PluginName,
    ) -> Result<PluginManifest, ManifestError> {
        if let Some(message) = self.failures.get(name.as_str()) {
            return Err(ManifestError::Network(message.clone()));
        }
        self.manifests
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| ManifestError::Network(format!("no manifest for {name}")))
    }
}

/// Dependency resolver with a fixed outcome.
#[derive(Debug, Default, Clone)]
pub struct StaticDependencyResolver {
    failure: Option<DependencyError>,
}

impl StaticDependencyResolver {
    /// Resolver that always succeeds.
    #[must_use]
    pub fn ok() -> Self {
        Self { failure: None }
    }

    /// Resolver that always fails with `error`.
    #[must_use]
    pub fn failing(error: DependencyError) -> Self {
        Self {
            failure: Some(error),
        }
    }
}

#[async_trait]
impl DependencyResolver for StaticDependencyResolver {
    async fn resolve(
        &self,
        _manifest: &PluginManifest,
        _host_version: &semver::Version,
        _allowed_names: &HashSet<String>,
    ) -> Result<(), DependencyError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Plugin module backed by a plain export map.
#[derive(Default)]
pub struct MockPluginModule {
    exports: HashMap<String, ExportHandle>,
    shared_init_failure: Option<String>,
}

impl MockPluginModule {
    /// Create a module with no exports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export under a code-reference name.
    #[must_use]
    pub fn with_export(mut self, name: &str, handle: ExportHandle) -> Self {
        self.exports.insert(name.to_string(), handle);
        self
    }

    /// Add a unit-valued export — enough for resolution tests that only
    /// care whether the reference resolves.
    #[must_use]
    pub fn with_unit_export(self, name: &str) -> Self {
        self.with_export(name, Arc::new(()))
    }

    /// Make `init_shared_scope` fail with this message.
    #[must_use]
    pub fn with_shared_init_failure(mut self, message: &str) -> Self {
        self.shared_init_failure = Some(message.to_string());
        self
    }
}

impl PluginModule for MockPluginModule {
    fn export(&self, name: &str) -> Option<ExportHandle> {
        self.exports.get(name).cloned()
    }

    fn init_shared_scope(&self, _scope: &SharedScope) -> Result<(), SharedScopeError> {
        match &self.shared_init_failure {
            Some(message) => Err(SharedScopeError(message.clone())),
            None => Ok(()),
        }
    }
}
