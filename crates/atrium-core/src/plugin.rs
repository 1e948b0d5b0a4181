//! Plugin identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::manifest::PluginManifest;

/// Validated, human-readable plugin name.
///
/// Plugin names are strings like `"console-demo"` or `"topology-view"`. They
/// must be non-empty and contain only lowercase alphanumeric characters and
/// hyphens. The name is what must be unique among loaded plugins; two
/// manifests sharing a name can never be active in the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PluginName(String);

/// Deserialize with validation — rejects malformed names (e.g. path or query
/// payloads smuggled through a crafted manifest).
impl<'de> Deserialize<'de> for PluginName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl PluginName {
    /// Create a new `PluginName`, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains invalid characters.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Create a `PluginName` without validation (for tests and internal use).
    #[must_use]
    pub fn from_static(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a string is a valid plugin name without constructing one.
    #[must_use]
    pub fn is_valid_name(name: &str) -> bool {
        Self::validate(name).is_ok()
    }

    /// Validate that a plugin name string is well-formed.
    fn validate(name: &str) -> CoreResult<()> {
        if name.is_empty() {
            return Err(CoreError::InvalidPluginName(
                "plugin name must not be empty".into(),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(CoreError::InvalidPluginName(format!(
                "plugin name must contain only lowercase alphanumeric characters and hyphens, got: {name}"
            )));
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(CoreError::InvalidPluginName(format!(
                "plugin name must not start or end with a hyphen, got: {name}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stable plugin identifier: `{name}@{version}`.
///
/// Derived deterministically from a manifest, so the same manifest always
/// yields the same id and manifests with different name or version yield
/// distinct ids. Used as the pending-load registry key and as the correlation
/// token a plugin bundle passes back through the entry hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct PluginId {
    name: PluginName,
    version: String,
}

impl PluginId {
    /// Derive the identifier for a manifest.
    #[must_use]
    pub fn from_manifest(manifest: &PluginManifest) -> Self {
        Self {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
        }
    }

    /// Build an identifier from validated parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the version segment is empty or contains `@`.
    pub fn new(name: PluginName, version: impl Into<String>) -> CoreResult<Self> {
        let version = version.into();
        if version.is_empty() || version.contains('@') {
            return Err(CoreError::InvalidPluginId(format!(
                "plugin version must be non-empty and must not contain '@', got: {version}"
            )));
        }
        Ok(Self { name, version })
    }

    /// The plugin name component.
    #[must_use]
    pub fn name(&self) -> &PluginName {
        &self.name
    }

    /// The plugin version component.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl From<PluginId> for String {
    fn from(id: PluginId) -> Self {
        id.to_string()
    }
}

impl std::str::FromStr for PluginId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = s
            .split_once('@')
            .ok_or_else(|| CoreError::InvalidPluginId(format!("missing '@' separator: {s}")))?;
        let name = PluginName::new(name)?;
        Self::new(name, version)
    }
}

impl<'de> Deserialize<'de> for PluginId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
