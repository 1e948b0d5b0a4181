//! The extension store contract.
//!
//! The store owns registered plugins, their enabled/disabled state, and the
//! extension lists the rest of the host consumes. The loader only talks to
//! it through this trait; the host shell provides the real implementation.

use std::collections::HashSet;

use crate::extension::ResolvedExtension;
use crate::manifest::PluginManifest;
use crate::plugin::PluginId;

/// Central store of dynamic plugins and their extensions.
pub trait ExtensionStore: Send + Sync {
    /// Register a plugin's manifest and resolved extensions.
    ///
    /// The plugin starts disabled; [`set_dynamic_plugin_enabled`] flips it
    /// on once activation completes.
    ///
    /// [`set_dynamic_plugin_enabled`]: ExtensionStore::set_dynamic_plugin_enabled
    fn add_dynamic_plugin(
        &self,
        plugin_id: &PluginId,
        manifest: &PluginManifest,
        extensions: Vec<ResolvedExtension>,
    );

    /// Enable or disable a registered plugin.
    fn set_dynamic_plugin_enabled(&self, plugin_id: &PluginId, enabled: bool);

    /// Names of plugins the host permits to be loaded.
    fn allowed_plugin_names(&self) -> HashSet<String>;
}
