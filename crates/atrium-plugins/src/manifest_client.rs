//! Manifest fetching.
//!
//! Manifests are served by the plugin gateway at
//! `{base_path}api/plugins/{name}/`. The client is a trait so activation can
//! be tested without a network; [`HttpManifestClient`] is the production
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use atrium_core::{PluginManifest, PluginName};

/// Why a manifest could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The gateway answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// The body did not parse as a plugin manifest.
    #[error("invalid manifest body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// Fetches plugin manifests by name.
#[async_trait]
pub trait ManifestClient: Send + Sync {
    /// The URL a given plugin's manifest is fetched from. Used for error
    /// reporting as well as fetching.
    fn manifest_url(&self, name: &PluginName) -> String;

    /// Fetch and parse the manifest for a plugin.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] on network failure, non-2xx status, or a
    /// schema-invalid body.
    async fn fetch(&self, name: &PluginName) -> Result<PluginManifest, ManifestError>;
}

/// HTTP manifest client backed by [`reqwest`].
pub struct HttpManifestClient {
    client: reqwest::Client,
    base_path: Url,
}

impl HttpManifestClient {
    /// Build a client for a gateway base path (must end with `/`).
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError::Network`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_path: Url, request_timeout: Duration) -> Result<Self, ManifestError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ManifestError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, base_path })
    }
}

#[async_trait]
impl ManifestClient for HttpManifestClient {
    fn manifest_url(&self, name: &PluginName) -> String {
        let base = self.base_path.as_str().trim_end_matches('/');
        format!("{base}/api/plugins/{name}/")
    }

    async fn fetch(&self, name: &PluginName) -> Result<PluginManifest, ManifestError> {
        let url = self.manifest_url(name);
        debug!(plugin = %name, url, "Fetching plugin manifest");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ManifestError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ManifestError::Status(response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ManifestError::Network(e.to_string()))?;
        let manifest = serde_json::from_str(&body)?;
        Ok(manifest)
    }
}

impl std::fmt::Debug for HttpManifestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpManifestClient")
            .field("base_path", &self.base_path.as_str())
            .finish_non_exhaustive()
    }
}
