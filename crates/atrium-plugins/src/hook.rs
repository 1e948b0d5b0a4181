//! The process-wide entry hook.
//!
//! Injected plugin bundles complete registration by invoking a single
//! well-known hook, passing their module namespace and the plugin id they
//! were built to register under. Rather than relying on an ambient global,
//! the hook lives in an explicit [`EntryHookRegistry`]: the loader binds its
//! handler under [`PLUGIN_ENTRY_HOOK`] at startup, and bundles (or the test
//! hosts standing in for them) dispatch through the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use atrium_core::{PluginId, PluginModule};

/// Well-known name of the plugin registration hook.
pub const PLUGIN_ENTRY_HOOK: &str = "atrium.load-plugin-entry";

/// Receiver side of the entry hook. This is the sole inbound channel from
/// plugin bundles back into the loader.
pub trait PluginEntryHook: Send + Sync {
    /// Invoked by a bundle exactly once, after it has evaluated.
    fn on_plugin_entry(&self, plugin_id: &PluginId, module: Arc<dyn PluginModule>);
}

/// Named hook bindings.
#[derive(Default)]
pub struct EntryHookRegistry {
    hooks: Mutex<HashMap<String, Arc<dyn PluginEntryHook>>>,
}

impl EntryHookRegistry {
    /// Create an empty hook registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a hook under a name. Intended to be called once at startup;
    /// rebinding replaces the previous handler and warns.
    pub fn bind(&self, name: impl Into<String>, hook: Arc<dyn PluginEntryHook>) {
        let name = name.into();
        let mut hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        if hooks.insert(name.clone(), hook).is_some() {
            warn!(hook = %name, "Rebinding an already-bound entry hook");
        }
    }

    /// Look up a bound hook.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn PluginEntryHook>> {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Remove a binding, reporting whether one existed. Teardown support.
    pub fn unbind(&self, name: &str) -> bool {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Invoke a bound hook, warning (and doing nothing else) if the name is
    /// unbound. This is what a bundle's bootstrap code calls.
    pub fn dispatch(&self, name: &str, plugin_id: &PluginId, module: Arc<dyn PluginModule>) {
        match self.get(name) {
            Some(hook) => hook.on_plugin_entry(plugin_id, module),
            None => {
                warn!(hook = %name, plugin_id = %plugin_id, "Dispatch to unbound entry hook; ignoring");
            },
        }
    }
}

impl std::fmt::Debug for EntryHookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("EntryHookRegistry")
            .field("bound", &hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::{ExportHandle, SharedScope, SharedScopeError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook(AtomicUsize);

    impl PluginEntryHook for CountingHook {
        fn on_plugin_entry(&self, _plugin_id: &PluginId, _module: Arc<dyn PluginModule>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct EmptyModule;

    impl PluginModule for EmptyModule {
        fn export(&self, _name: &str) -> Option<ExportHandle> {
            None
        }
        fn init_shared_scope(&self, _scope: &SharedScope) -> Result<(), SharedScopeError> {
            Ok(())
        }
    }

    #[test]
    fn test_bind_dispatch_unbind() {
        let registry = EntryHookRegistry::new();
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        registry.bind(PLUGIN_ENTRY_HOOK, hook.clone());

        let id: PluginId = "demo@1.0.0".parse().unwrap();
        registry.dispatch(PLUGIN_ENTRY_HOOK, &id, Arc::new(EmptyModule));
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);

        assert!(registry.unbind(PLUGIN_ENTRY_HOOK));
        assert!(!registry.unbind(PLUGIN_ENTRY_HOOK));
        assert!(registry.get(PLUGIN_ENTRY_HOOK).is_none());
    }

    #[test]
    fn test_dispatch_to_unbound_hook_is_noop() {
        let registry = EntryHookRegistry::new();
        let id: PluginId = "demo@1.0.0".parse().unwrap();
        // Must not panic.
        registry.dispatch(PLUGIN_ENTRY_HOOK, &id, Arc::new(EmptyModule));
    }

    #[test]
    fn test_rebinding_replaces() {
        let registry = EntryHookRegistry::new();
        let first = Arc::new(CountingHook(AtomicUsize::new(0)));
        let second = Arc::new(CountingHook(AtomicUsize::new(0)));
        registry.bind(PLUGIN_ENTRY_HOOK, first.clone());
        registry.bind(PLUGIN_ENTRY_HOOK, second.clone());

        let id: PluginId = "demo@1.0.0".parse().unwrap();
        registry.dispatch(PLUGIN_ENTRY_HOOK, &id, Arc::new(EmptyModule));
        assert_eq!(first.0.load(Ordering::SeqCst), 0);
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
    }
}
