//! The namespace a loaded plugin bundle exposes, and shared-scope binding.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque handle to a value exported by a plugin module.
///
/// The host downcasts handles at the point of use; the loader itself never
/// inspects them.
pub type ExportHandle = Arc<dyn Any + Send + Sync>;

/// The namespace object a plugin's entry bundle exposes once loaded.
///
/// This is what the bundle hands to the entry hook. The loader resolves the
/// manifest's code references against it and gives it the host's shared
/// scope to bind against.
pub trait PluginModule: Send + Sync {
    /// Look up an export by the name a code reference carries.
    fn export(&self, name: &str) -> Option<ExportHandle>;

    /// Bind the module's declared shared dependencies to the host's
    /// instances.
    ///
    /// Called exactly once, before any code reference is resolved. The
    /// default does nothing; bundles with shared dependencies override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the module cannot work with the scope it was
    /// given (e.g. a required shared dependency is missing).
    fn init_shared_scope(&self, scope: &SharedScope) -> Result<(), SharedScopeError> {
        let _ = scope;
        Ok(())
    }
}

/// Shared-scope initialization failure.
#[derive(Debug, thiserror::Error)]
#[error("shared scope initialization failed: {0}")]
pub struct SharedScopeError(pub String);

/// The host's shared module instances, keyed by specifier.
#[derive(Default)]
pub struct SharedScope {
    modules: HashMap<String, ExportHandle>,
}

impl SharedScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shared instance under a specifier, replacing any existing one.
    #[must_use]
    pub fn with_module(mut self, specifier: impl Into<String>, handle: ExportHandle) -> Self {
        self.modules.insert(specifier.into(), handle);
        self
    }

    /// Look up a shared instance.
    #[must_use]
    pub fn get(&self, specifier: &str) -> Option<&ExportHandle> {
        self.modules.get(specifier)
    }

    /// Specifiers of all shared instances in this scope.
    #[must_use]
    pub fn specifiers(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for SharedScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedScope")
            .field("specifiers", &self.specifiers())
            .finish()
    }
}

/// Collaborator that initializes a freshly loaded module's shared bindings.
///
/// Injected into the entry callback handler so it can be substituted in
/// tests.
pub trait SharedModuleInit: Send + Sync {
    /// Initialize the module against the host's shared scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the module rejects the scope; the caller treats
    /// the plugin as registered-but-inert.
    fn initialize(&self, module: &dyn PluginModule) -> Result<(), SharedScopeError>;
}

/// Default [`SharedModuleInit`]: hands the host's [`SharedScope`] to
/// [`PluginModule::init_shared_scope`].
pub struct SharedScopeInitializer {
    scope: SharedScope,
}

impl SharedScopeInitializer {
    /// Create an initializer around the host's shared scope.
    #[must_use]
    pub fn new(scope: SharedScope) -> Self {
        Self { scope }
    }
}

impl SharedModuleInit for SharedScopeInitializer {
    fn initialize(&self, module: &dyn PluginModule) -> Result<(), SharedScopeError> {
        module.init_shared_scope(&self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScopedModule;

    impl PluginModule for ScopedModule {
        fn export(&self, _name: &str) -> Option<ExportHandle> {
            None
        }

        fn init_shared_scope(&self, scope: &SharedScope) -> Result<(), SharedScopeError> {
            scope
                .get("host-react")
                .map(|_| ())
                .ok_or_else(|| SharedScopeError("missing host-react".into()))
        }
    }

    #[test]
    fn test_shared_scope_lookup() {
        let scope = SharedScope::new().with_module("host-react", Arc::new(1_u8));
        assert!(scope.get("host-react").is_some());
        assert!(scope.get("other").is_none());
        assert_eq!(scope.specifiers(), vec!["host-react"]);
    }

    #[test]
    fn test_initializer_passes_scope_through() {
        let ok = SharedScopeInitializer::new(SharedScope::new().with_module(
            "host-react",
            Arc::new(1_u8) as ExportHandle,
        ));
        assert!(ok.initialize(&ScopedModule).is_ok());

        let missing = SharedScopeInitializer::new(SharedScope::new());
        assert!(missing.initialize(&ScopedModule).is_err());
    }

    #[test]
    fn test_default_init_is_noop() {
        struct Bare;
        impl PluginModule for Bare {
            fn export(&self, _name: &str) -> Option<ExportHandle> {
                None
            }
        }
        assert!(Bare.init_shared_scope(&SharedScope::new()).is_ok());
    }
}
