//! Plugin loading error types.

use atrium_core::PluginId;

use crate::dependencies::DependencyError;
use crate::manifest_client::ManifestError;

/// Errors from plugin loading operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginLoadError {
    /// A plugin sharing this manifest name already has a load record.
    #[error("a plugin named {0} is already loaded")]
    DuplicatePlugin(String),

    /// The entry script could not be loaded at the transport level.
    #[error("failed to load plugin entry script from {url}: {source}")]
    ScriptLoadFailed {
        /// The entry resource URL that failed to load.
        url: String,
        /// The underlying load failure.
        #[source]
        source: ResourceLoadError,
    },

    /// The entry script loaded but never invoked the registration hook —
    /// a contract violation by the plugin bundle.
    #[error("entry script for plugin {0} loaded but never invoked the registration hook")]
    CallbackNotFired(PluginId),

    /// The plugin manifest could not be fetched or parsed.
    #[error("failed to fetch plugin manifest from {url}: {source}")]
    ManifestFetchFailed {
        /// The manifest URL.
        url: String,
        /// The underlying fetch failure.
        #[source]
        source: ManifestError,
    },

    /// The plugin's declared requirements could not be satisfied.
    #[error("dependency resolution failed for plugin {name}: {source}")]
    DependencyResolutionFailed {
        /// The plugin whose requirements failed.
        name: String,
        /// The unsatisfied requirement.
        #[source]
        source: DependencyError,
    },

    /// The loader configuration is unusable.
    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for plugin loading operations.
pub type LoadResult<T> = Result<T, PluginLoadError>;

/// A transport-level script load failure reported by the resource host.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ResourceLoadError(pub String);
