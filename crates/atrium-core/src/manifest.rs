//! Plugin manifest types.
//!
//! A manifest is the document served by the plugin gateway that describes a
//! plugin's identity, where its entry bundle lives, what it requires from the
//! host, and which extensions it contributes. Manifests are immutable once
//! the loader has recorded them.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::extension::ExtensionDeclaration;
use crate::plugin::PluginName;

/// Requirement name that targets the host release itself rather than another
/// plugin.
pub const HOST_REQUIREMENT: &str = "atrium";

/// A plugin manifest fetched from the plugin gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Unique plugin name.
    pub name: PluginName,
    /// Version string, e.g. `"1.0.0"`.
    pub version: String,
    /// Optional human-readable display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base URL the plugin's resources (including the entry bundle) are
    /// served from.
    pub base_url: Url,
    /// What the plugin requires from the host and from other plugins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<PluginRequirement>,
    /// Extensions the plugin contributes to the host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ExtensionDeclaration>,
}

/// A single dependency declared by a plugin.
///
/// `name == `[`HOST_REQUIREMENT`] constrains the host release version; any
/// other name refers to another dynamic plugin, which must be present in the
/// store's allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequirement {
    /// Requirement target: the host, or another plugin's name.
    pub name: String,
    /// Acceptable version range, e.g. `">=1.2.0, <2"`.
    pub version_range: semver::VersionReq,
}

impl PluginManifest {
    /// Build a minimal manifest for unit tests.
    #[cfg(test)]
    pub(crate) fn minimal_for_tests(name: &str, version: &str) -> Self {
        Self {
            name: PluginName::from_static(name),
            version: version.to_string(),
            display_name: None,
            description: None,
            base_url: Url::parse(&format!("https://plugins.example.com/{name}/")).unwrap(),
            requirements: vec![],
            extensions: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_round_trip() {
        let json = r#"{
            "name": "console-demo",
            "version": "1.0.0",
            "display_name": "Console Demo",
            "base_url": "https://plugins.example.com/console-demo/",
            "requirements": [
                { "name": "atrium", "version_range": ">=4.10.0" }
            ],
            "extensions": [
                { "kind": "console.nav/item", "properties": { "label": "Demo" } }
            ]
        }"#;
        let manifest: PluginManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.name.as_str(), "console-demo");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.requirements.len(), 1);
        assert_eq!(manifest.requirements[0].name, HOST_REQUIREMENT);
        assert_eq!(manifest.extensions.len(), 1);

        let serialized = serde_json::to_string(&manifest).unwrap();
        let parsed: PluginManifest = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed.name, manifest.name);
        assert_eq!(parsed.version, manifest.version);
    }

    #[test]
    fn test_minimal_manifest() {
        let json = r#"{
            "name": "bare",
            "version": "0.1.0",
            "base_url": "https://plugins.example.com/bare/"
        }"#;
        let manifest: PluginManifest = serde_json::from_str(json).unwrap();
        assert!(manifest.display_name.is_none());
        assert!(manifest.requirements.is_empty());
        assert!(manifest.extensions.is_empty());
    }

    #[test]
    fn test_manifest_rejects_invalid_name() {
        let json = r#"{
            "name": "Not Valid",
            "version": "0.1.0",
            "base_url": "https://plugins.example.com/x/"
        }"#;
        assert!(serde_json::from_str::<PluginManifest>(json).is_err());
    }

    #[test]
    fn test_requirement_version_range_parses() {
        let json = r#"{ "name": "atrium", "version_range": ">=2.0.0" }"#;
        let req: PluginRequirement = serde_json::from_str(json).unwrap();
        assert!(req.version_range.matches(&semver::Version::new(2, 1, 0)));
        assert!(!req.version_range.matches(&semver::Version::new(1, 9, 9)));
    }
}
