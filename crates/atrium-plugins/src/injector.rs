//! Script injection.
//!
//! Builds the cache-busted entry resource URL for a manifest, records the
//! pending load, attaches the script element, and maps the load outcome to
//! the loader's error taxonomy.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use atrium_core::{PluginId, PluginManifest};

use crate::error::{LoadResult, PluginLoadError, ResourceLoadError};
use crate::host::{ResourceHost, ScriptElement};
use crate::registry::PendingPluginRegistry;

/// Well-known entry bundle filename, resolved against a manifest's base URL.
pub const PLUGIN_ENTRY_FILE: &str = "plugin-entry.wasm";

/// Query parameter carrying the per-attempt cache-busting token.
pub const CACHE_BUSTER_PARAM: &str = "cacheBuster";

/// Prefix of every script element id the injector creates.
pub const SCRIPT_ELEMENT_PREFIX: &str = "atrium-plugin-entry-";

/// Injects plugin entry scripts into a [`ResourceHost`].
pub struct ScriptInjector {
    registry: Arc<PendingPluginRegistry>,
    host: Arc<dyn ResourceHost>,
    entry_file: String,
}

impl ScriptInjector {
    /// Create an injector over a registry and host surface.
    #[must_use]
    pub fn new(
        registry: Arc<PendingPluginRegistry>,
        host: Arc<dyn ResourceHost>,
        entry_file: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            host,
            entry_file: entry_file.into(),
        }
    }

    /// Inject a plugin's entry script and wait for it to register itself.
    ///
    /// The duplicate-name check happens before any host side effect; a
    /// rejected call attaches nothing. On any failure past that check the
    /// registry record and the attached element are left in place — the
    /// plugin is treated as permanently failed for this session and the
    /// name cannot be retried without a reset.
    ///
    /// # Errors
    ///
    /// - [`PluginLoadError::DuplicatePlugin`] if a load record with the
    ///   same manifest name already exists.
    /// - [`PluginLoadError::ScriptLoadFailed`] on transport-level failure.
    /// - [`PluginLoadError::CallbackNotFired`] if the script loaded but
    ///   never invoked the registration hook.
    pub async fn inject(&self, manifest: &PluginManifest) -> LoadResult<PluginId> {
        let plugin_id = PluginId::from_manifest(manifest);
        self.registry.begin(&plugin_id, manifest)?;

        let url = self.entry_url(&manifest.base_url)?;
        let element = ScriptElement {
            element_id: format!("{SCRIPT_ELEMENT_PREFIX}{}", manifest.name),
            url: url.clone(),
        };
        debug!(plugin_id = %plugin_id, url = %url, "Injecting plugin entry script");

        match self.host.attach_script(element).await {
            Ok(()) => {
                let fired = self
                    .registry
                    .get(&plugin_id)
                    .is_some_and(|snapshot| snapshot.entry_callback_fired);
                if fired {
                    info!(plugin_id = %plugin_id, "Plugin entry script loaded and registered");
                    Ok(plugin_id)
                } else {
                    Err(PluginLoadError::CallbackNotFired(plugin_id))
                }
            },
            Err(source) => Err(PluginLoadError::ScriptLoadFailed {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Entry URL: entry file resolved against the manifest base URL, plus a
    /// fresh cache-busting token so a stale cached bundle is never served
    /// after a plugin update.
    fn entry_url(&self, base_url: &Url) -> LoadResult<Url> {
        let mut url = base_url.join(&self.entry_file).map_err(|e| {
            PluginLoadError::ScriptLoadFailed {
                url: base_url.to_string(),
                source: ResourceLoadError(format!(
                    "cannot resolve entry file {:?} against base URL: {e}",
                    self.entry_file
                )),
            }
        })?;
        url.query_pairs_mut()
            .append_pair(CACHE_BUSTER_PARAM, &Uuid::new_v4().to_string());
        Ok(url)
    }
}

impl std::fmt::Debug for ScriptInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptInjector")
            .field("entry_file", &self.entry_file)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::PluginName;
    use std::sync::Mutex;

    /// Host that loads everything successfully and never fires callbacks.
    #[derive(Default)]
    struct RecordingHost {
        attached: Mutex<Vec<ScriptElement>>,
    }

    #[async_trait::async_trait]
    impl ResourceHost for RecordingHost {
        async fn attach_script(&self, element: ScriptElement) -> Result<(), ResourceLoadError> {
            self.attached.lock().unwrap().push(element);
            Ok(())
        }

        fn remove_scripts_with_prefix(&self, prefix: &str) {
            self.attached
                .lock()
                .unwrap()
                .retain(|e| !e.element_id.starts_with(prefix));
        }

        fn attached_scripts(&self) -> Vec<ScriptElement> {
            self.attached.lock().unwrap().clone()
        }
    }

    fn manifest(name: &str, version: &str) -> PluginManifest {
        PluginManifest {
            name: PluginName::from_static(name),
            version: version.to_string(),
            display_name: None,
            description: None,
            base_url: Url::parse(&format!("https://plugins.example.com/{name}/")).unwrap(),
            requirements: vec![],
            extensions: vec![],
        }
    }

    fn injector(registry: &Arc<PendingPluginRegistry>, host: &Arc<RecordingHost>) -> ScriptInjector {
        ScriptInjector::new(
            Arc::clone(registry),
            Arc::clone(host) as Arc<dyn ResourceHost>,
            PLUGIN_ENTRY_FILE,
        )
    }

    fn cache_buster(url: &Url) -> String {
        url.query_pairs()
            .find(|(key, _)| key == CACHE_BUSTER_PARAM)
            .map(|(_, value)| value.into_owned())
            .expect("entry URL must carry a cache buster")
    }

    #[tokio::test]
    async fn test_callback_not_fired_when_script_is_silent() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let host = Arc::new(RecordingHost::default());
        let result = injector(&registry, &host).inject(&manifest("alpha", "1.0.0")).await;

        assert!(matches!(
            result.unwrap_err(),
            PluginLoadError::CallbackNotFired(id) if id.to_string() == "alpha@1.0.0"
        ));
        // The element and the record both stay in place.
        assert_eq!(host.attached_scripts().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_attaches_nothing() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let host = Arc::new(RecordingHost::default());
        let injector = injector(&registry, &host);

        let _ = injector.inject(&manifest("alpha", "1.0.0")).await;
        assert_eq!(host.attached_scripts().len(), 1);

        let result = injector.inject(&manifest("alpha", "2.0.0")).await;
        assert!(matches!(
            result.unwrap_err(),
            PluginLoadError::DuplicatePlugin(name) if name == "alpha"
        ));
        // No second element was attached.
        assert_eq!(host.attached_scripts().len(), 1);
    }

    #[tokio::test]
    async fn test_entry_url_shape() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let host = Arc::new(RecordingHost::default());
        let _ = injector(&registry, &host).inject(&manifest("alpha", "1.0.0")).await;

        let attached = host.attached_scripts();
        assert_eq!(attached[0].element_id, "atrium-plugin-entry-alpha");
        assert_eq!(attached[0].url.path(), "/alpha/plugin-entry.wasm");
        assert!(!cache_buster(&attached[0].url).is_empty());
    }

    #[tokio::test]
    async fn test_cache_buster_fresh_on_every_call() {
        let registry = Arc::new(PendingPluginRegistry::new());
        let host = Arc::new(RecordingHost::default());
        let injector = injector(&registry, &host);
        let m = manifest("alpha", "1.0.0");

        let _ = injector.inject(&m).await;
        registry.clear();
        let _ = injector.inject(&m).await;

        let attached = host.attached_scripts();
        assert_eq!(attached.len(), 2);
        assert_ne!(cache_buster(&attached[0].url), cache_buster(&attached[1].url));
    }

    #[tokio::test]
    async fn test_script_load_failure_is_wrapped() {
        struct FailingHost;

        #[async_trait::async_trait]
        impl ResourceHost for FailingHost {
            async fn attach_script(
                &self,
                _element: ScriptElement,
            ) -> Result<(), ResourceLoadError> {
                Err(ResourceLoadError("connection reset".into()))
            }
            fn remove_scripts_with_prefix(&self, _prefix: &str) {}
            fn attached_scripts(&self) -> Vec<ScriptElement> {
                vec![]
            }
        }

        let registry = Arc::new(PendingPluginRegistry::new());
        let injector = ScriptInjector::new(
            Arc::clone(&registry),
            Arc::new(FailingHost),
            PLUGIN_ENTRY_FILE,
        );
        let result = injector.inject(&manifest("alpha", "1.0.0")).await;

        match result.unwrap_err() {
            PluginLoadError::ScriptLoadFailed { url, source } => {
                assert!(url.contains("plugin-entry.wasm"));
                assert_eq!(source.0, "connection reset");
            },
            other => panic!("expected ScriptLoadFailed, got {other:?}"),
        }
        // The record survives the failure; no retry without a reset.
        assert_eq!(registry.len(), 1);
    }
}
