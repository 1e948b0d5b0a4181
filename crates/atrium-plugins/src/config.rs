//! Loader configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::injector::PLUGIN_ENTRY_FILE;

fn default_base_path() -> String {
    "https://localhost:9443/".to_string()
}

fn default_host_version() -> semver::Version {
    semver::Version::parse(env!("CARGO_PKG_VERSION"))
        .unwrap_or_else(|_| semver::Version::new(0, 0, 0))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_entry_file() -> String {
    PLUGIN_ENTRY_FILE.to_string()
}

/// Configuration for the plugin loader.
///
/// Deserializable from the host's TOML configuration; every field has a
/// default so a missing `[plugins]` table works.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Base path of the plugin gateway manifests are fetched from.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// The host release version plugin requirements are resolved against.
    #[serde(default = "default_host_version")]
    pub host_version: semver::Version,

    /// Timeout for manifest requests, in seconds. Script loads have no
    /// loader-side timeout; transport behavior is the host surface's.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Entry bundle filename resolved against each manifest's base URL.
    #[serde(default = "default_entry_file")]
    pub entry_file: String,
}

impl LoaderConfig {
    /// Manifest request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            host_version: default_host_version(),
            request_timeout_secs: default_request_timeout_secs(),
            entry_file: default_entry_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.entry_file, PLUGIN_ENTRY_FILE);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: LoaderConfig = toml::from_str("").unwrap();
        assert_eq!(config.base_path, "https://localhost:9443/");
        assert_eq!(config.entry_file, PLUGIN_ENTRY_FILE);
    }

    #[test]
    fn test_toml_overrides() {
        let config: LoaderConfig = toml::from_str(
            r#"
            base_path = "https://console.example.com/"
            host_version = "4.12.0"
            request_timeout_secs = 5
            entry_file = "entry.bundle"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_path, "https://console.example.com/");
        assert_eq!(config.host_version, semver::Version::new(4, 12, 0));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.entry_file, "entry.bundle");
    }
}
