//! Dependency resolution.
//!
//! Before a plugin's entry script is injected, its declared requirements are
//! checked against the host release version and the store's allow-list of
//! permitted plugin names. The resolver is a trait so activation can be
//! tested with a substitute; [`SemverDependencyResolver`] is the default.

use std::collections::HashSet;

use async_trait::async_trait;

use atrium_core::{HOST_REQUIREMENT, PluginManifest};

/// An unsatisfiable plugin requirement.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DependencyError {
    /// The host release version does not satisfy the plugin's required
    /// range.
    #[error("host version {actual} does not satisfy required range {required}")]
    HostVersionMismatch {
        /// The range the plugin requires.
        required: semver::VersionReq,
        /// The host's actual release version.
        actual: semver::Version,
    },

    /// A plugin name is not in the allow-list of dynamic plugins.
    #[error("plugin {0} is not in the allow-list of dynamic plugins")]
    NotAllowed(String),
}

/// Checks a manifest's requirements against the host.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    /// Resolve all of `manifest`'s requirements.
    ///
    /// # Errors
    ///
    /// Returns the first unsatisfiable requirement.
    async fn resolve(
        &self,
        manifest: &PluginManifest,
        host_version: &semver::Version,
        allowed_names: &HashSet<String>,
    ) -> Result<(), DependencyError>;
}

/// Default resolver.
///
/// The plugin itself must be in the allow-list; a requirement named
/// [`HOST_REQUIREMENT`] constrains the host release version; every other
/// requirement names another plugin, which must also be allow-listed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemverDependencyResolver;

#[async_trait]
impl DependencyResolver for SemverDependencyResolver {
    async fn resolve(
        &self,
        manifest: &PluginManifest,
        host_version: &semver::Version,
        allowed_names: &HashSet<String>,
    ) -> Result<(), DependencyError> {
        if !allowed_names.contains(manifest.name.as_str()) {
            return Err(DependencyError::NotAllowed(manifest.name.to_string()));
        }
        for requirement in &manifest.requirements {
            if requirement.name == HOST_REQUIREMENT {
                if !requirement.version_range.matches(host_version) {
                    return Err(DependencyError::HostVersionMismatch {
                        required: requirement.version_range.clone(),
                        actual: host_version.clone(),
                    });
                }
            } else if !allowed_names.contains(&requirement.name) {
                return Err(DependencyError::NotAllowed(requirement.name.clone()));
            }
        }
        Ok(())
    }
}
