//! Manifest and extension fixtures.

use serde_json::{Value, json};
use url::Url;

use atrium_core::{
    ExtensionDeclaration, HOST_REQUIREMENT, PluginManifest, PluginName, PluginRequirement,
};

/// A minimal valid manifest for `name` at `version`, served from
/// `https://plugins.example.com/{name}/`.
///
/// # Panics
///
/// Panics if `name` cannot form a valid base URL.
#[must_use]
pub fn manifest(name: &str, version: &str) -> PluginManifest {
    PluginManifest {
        name: PluginName::from_static(name),
        version: version.to_string(),
        display_name: None,
        description: None,
        base_url: Url::parse(&format!("https://plugins.example.com/{name}/"))
            .expect("fixture base URL must parse"),
        requirements: vec![],
        extensions: vec![],
    }
}

/// [`manifest`] plus extension declarations.
#[must_use]
pub fn manifest_with_extensions(
    name: &str,
    version: &str,
    extensions: Vec<ExtensionDeclaration>,
) -> PluginManifest {
    PluginManifest {
        extensions,
        ..manifest(name, version)
    }
}

/// An extension declaration from a JSON properties object.
///
/// # Panics
///
/// Panics if `properties` is not a JSON object.
#[must_use]
pub fn extension(kind: &str, properties: Value) -> ExtensionDeclaration {
    ExtensionDeclaration {
        kind: kind.to_string(),
        properties: properties
            .as_object()
            .expect("extension fixture properties must be a JSON object")
            .clone(),
    }
}

/// An encoded code-reference property value.
#[must_use]
pub fn code_ref(export: &str) -> Value {
    json!({ "$codeRef": export })
}

/// A requirement on the host release version.
///
/// # Panics
///
/// Panics if `range` is not a valid semver range.
#[must_use]
pub fn host_requirement(range: &str) -> PluginRequirement {
    PluginRequirement {
        name: HOST_REQUIREMENT.to_string(),
        version_range: range.parse().expect("fixture version range must parse"),
    }
}

/// A requirement on another dynamic plugin.
///
/// # Panics
///
/// Panics if `range` is not a valid semver range.
#[must_use]
pub fn plugin_requirement(name: &str, range: &str) -> PluginRequirement {
    PluginRequirement {
        name: name.to_string(),
        version_range: range.parse().expect("fixture version range must parse"),
    }
}
