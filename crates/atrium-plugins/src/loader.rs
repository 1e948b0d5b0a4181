//! Plugin activation orchestration.
//!
//! [`PluginLoader`] owns the loader's long-lived state and drives the
//! activation pipeline. It is assembled through [`PluginLoaderBuilder`],
//! which wires the entry callback handler and binds it under
//! [`PLUGIN_ENTRY_HOOK`] so injected bundles can reach it.

use std::sync::Arc;

use tracing::{error, info};
use url::Url;

use atrium_core::{
    CodeRefResolver, DefaultCodeRefResolver, ExtensionStore, PluginName, SharedModuleInit,
    SharedScope, SharedScopeInitializer,
};

use crate::config::LoaderConfig;
use crate::dependencies::{DependencyResolver, SemverDependencyResolver};
use crate::entry::EntryCallbackHandler;
use crate::error::{LoadResult, PluginLoadError};
use crate::hook::{EntryHookRegistry, PLUGIN_ENTRY_HOOK};
use crate::host::ResourceHost;
use crate::injector::{SCRIPT_ELEMENT_PREFIX, ScriptInjector};
use crate::manifest_client::{HttpManifestClient, ManifestClient};
use crate::registry::{PendingPluginRegistry, PluginLoadSnapshot};

/// The dynamic plugin loader.
///
/// One instance lives for the whole session; its pending-load registry is
/// the process-wide record of which plugins have been injected. Activation
/// failures are terminal per attempt — there are no automatic retries, and
/// a name that got as far as injection cannot be retried without
/// [`reset`](Self::reset).
pub struct PluginLoader {
    config: LoaderConfig,
    registry: Arc<PendingPluginRegistry>,
    host: Arc<dyn ResourceHost>,
    hooks: Arc<EntryHookRegistry>,
    manifests: Arc<dyn ManifestClient>,
    dependencies: Arc<dyn DependencyResolver>,
    injector: ScriptInjector,
    store: Arc<dyn ExtensionStore>,
}

impl PluginLoader {
    /// Start building a loader.
    #[must_use]
    pub fn builder(config: LoaderConfig) -> PluginLoaderBuilder {
        PluginLoaderBuilder::new(config)
    }

    /// Activate a plugin end to end.
    ///
    /// Strict linear pipeline: fetch manifest, resolve requirements, inject
    /// the entry script, enable the plugin in the store. A failure at any
    /// stage calls `on_error` with a human-readable message and the typed
    /// cause, and the remaining stages never run.
    pub async fn activate<F>(&self, name: &PluginName, on_error: F)
    where
        F: FnOnce(String, &PluginLoadError),
    {
        let manifest = match self.manifests.fetch(name).await {
            Ok(manifest) => manifest,
            Err(source) => {
                let err = PluginLoadError::ManifestFetchFailed {
                    url: self.manifests.manifest_url(name),
                    source,
                };
                report(name, &err, on_error);
                return;
            },
        };

        let allowed = self.store.allowed_plugin_names();
        if let Err(source) = self
            .dependencies
            .resolve(&manifest, &self.config.host_version, &allowed)
            .await
        {
            let err = PluginLoadError::DependencyResolutionFailed {
                name: name.to_string(),
                source,
            };
            report(name, &err, on_error);
            return;
        }

        let plugin_id = match self.injector.inject(&manifest).await {
            Ok(plugin_id) => plugin_id,
            Err(err) => {
                report(name, &err, on_error);
                return;
            },
        };

        self.store.set_dynamic_plugin_enabled(&plugin_id, true);
        info!(plugin_id = %plugin_id, "Dynamic plugin enabled");
    }

    /// Activate a list of plugins sequentially.
    pub async fn activate_all<F>(&self, names: &[PluginName], on_error: F)
    where
        F: Fn(&PluginName, String, &PluginLoadError),
    {
        for name in names {
            self.activate(name, |message, err| on_error(name, message, err))
                .await;
        }
    }

    /// Snapshots of every pending or completed load, for assertions and
    /// diagnostics.
    #[must_use]
    pub fn pending_loads(&self) -> Vec<PluginLoadSnapshot> {
        self.registry.snapshot()
    }

    /// The loader's pending-load registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<PendingPluginRegistry> {
        &self.registry
    }

    /// The hook registry the entry handler is bound into.
    #[must_use]
    pub fn hooks(&self) -> &Arc<EntryHookRegistry> {
        &self.hooks
    }

    /// Tear down loader state: clear the registry, remove every injected
    /// script element, and unbind the entry hook. Test/teardown support —
    /// normal operation never unloads plugins.
    pub fn reset(&self) {
        self.registry.clear();
        self.host.remove_scripts_with_prefix(SCRIPT_ELEMENT_PREFIX);
        self.hooks.unbind(PLUGIN_ENTRY_HOOK);
    }
}

impl std::fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLoader")
            .field("pending", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// One stage failed; surface it to the caller's reporter.
fn report<F>(name: &PluginName, err: &PluginLoadError, on_error: F)
where
    F: FnOnce(String, &PluginLoadError),
{
    let message = format!("Failed to activate plugin {name}: {err}");
    error!(plugin = %name, error = %err, "Plugin activation failed");
    on_error(message, err);
}

/// Builder for [`PluginLoader`].
///
/// The resource host and extension store are mandatory; every other
/// collaborator has a production default.
pub struct PluginLoaderBuilder {
    config: LoaderConfig,
    host: Option<Arc<dyn ResourceHost>>,
    store: Option<Arc<dyn ExtensionStore>>,
    hooks: Option<Arc<EntryHookRegistry>>,
    manifests: Option<Arc<dyn ManifestClient>>,
    dependencies: Option<Arc<dyn DependencyResolver>>,
    shared_init: Option<Arc<dyn SharedModuleInit>>,
    code_refs: Option<Arc<dyn CodeRefResolver>>,
}

impl PluginLoaderBuilder {
    fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            host: None,
            store: None,
            hooks: None,
            manifests: None,
            dependencies: None,
            shared_init: None,
            code_refs: None,
        }
    }

    /// Set the host surface script elements are attached to. Mandatory.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn ResourceHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the extension store. Mandatory.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ExtensionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share an externally owned hook registry (defaults to a fresh one).
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<EntryHookRegistry>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Substitute the manifest client (defaults to [`HttpManifestClient`]
    /// against the configured base path).
    #[must_use]
    pub fn with_manifest_client(mut self, manifests: Arc<dyn ManifestClient>) -> Self {
        self.manifests = Some(manifests);
        self
    }

    /// Substitute the dependency resolver (defaults to
    /// [`SemverDependencyResolver`]).
    #[must_use]
    pub fn with_dependency_resolver(mut self, dependencies: Arc<dyn DependencyResolver>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Set the shared scope handed to loaded modules (defaults to empty).
    #[must_use]
    pub fn with_shared_scope(mut self, scope: SharedScope) -> Self {
        self.shared_init = Some(Arc::new(SharedScopeInitializer::new(scope)));
        self
    }

    /// Substitute the shared-module initializer wholesale.
    #[must_use]
    pub fn with_shared_init(mut self, shared_init: Arc<dyn SharedModuleInit>) -> Self {
        self.shared_init = Some(shared_init);
        self
    }

    /// Substitute the code-reference resolver (defaults to
    /// [`DefaultCodeRefResolver`]).
    #[must_use]
    pub fn with_code_ref_resolver(mut self, code_refs: Arc<dyn CodeRefResolver>) -> Self {
        self.code_refs = Some(code_refs);
        self
    }

    /// Wire everything up and bind the entry hook.
    ///
    /// # Errors
    ///
    /// Returns [`PluginLoadError::InvalidConfig`] if a mandatory
    /// collaborator is missing or the configured base path is not a valid
    /// URL.
    pub fn build(self) -> LoadResult<PluginLoader> {
        let host = self
            .host
            .ok_or_else(|| PluginLoadError::InvalidConfig("resource host is required".into()))?;
        let store = self
            .store
            .ok_or_else(|| PluginLoadError::InvalidConfig("extension store is required".into()))?;

        let manifests: Arc<dyn ManifestClient> = match self.manifests {
            Some(manifests) => manifests,
            None => {
                let base_path = Url::parse(&self.config.base_path).map_err(|e| {
                    PluginLoadError::InvalidConfig(format!(
                        "base path {:?} is not a valid URL: {e}",
                        self.config.base_path
                    ))
                })?;
                let client = HttpManifestClient::new(base_path, self.config.request_timeout())
                    .map_err(|e| PluginLoadError::InvalidConfig(e.to_string()))?;
                Arc::new(client)
            },
        };

        let registry = Arc::new(PendingPluginRegistry::new());
        let hooks = self.hooks.unwrap_or_default();
        let shared_init = self
            .shared_init
            .unwrap_or_else(|| Arc::new(SharedScopeInitializer::new(SharedScope::new())));
        let code_refs = self
            .code_refs
            .unwrap_or_else(|| Arc::new(DefaultCodeRefResolver));

        let handler = Arc::new(EntryCallbackHandler::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            shared_init,
            code_refs,
        ));
        hooks.bind(PLUGIN_ENTRY_HOOK, handler);

        let injector = ScriptInjector::new(
            Arc::clone(&registry),
            Arc::clone(&host),
            self.config.entry_file.clone(),
        );

        Ok(PluginLoader {
            config: self.config,
            registry,
            host,
            hooks,
            manifests,
            dependencies: self
                .dependencies
                .unwrap_or_else(|| Arc::new(SemverDependencyResolver)),
            injector,
            store,
        })
    }
}

impl std::fmt::Debug for PluginLoaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLoaderBuilder")
            .field("has_host", &self.host.is_some())
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
