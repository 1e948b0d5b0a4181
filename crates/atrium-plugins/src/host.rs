//! The surface the loader injects script elements into.
//!
//! In production this is backed by the host shell's document; tests use a
//! scripted mock. Abstracting it keeps the injector free of any direct
//! document dependency.

use async_trait::async_trait;
use url::Url;

use crate::error::ResourceLoadError;

/// An async-loading script element attached to the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    /// Deterministic, human-readable element identifier derived from the
    /// plugin name, so the element can be located and removed later.
    pub element_id: String,
    /// The cache-busted entry resource URL.
    pub url: Url,
}

/// Host surface that loads remote script resources.
#[async_trait]
pub trait ResourceHost: Send + Sync {
    /// Attach a script element and drive its load to completion.
    ///
    /// Resolves once the resource has finished loading *and evaluating* —
    /// by which point a well-behaved bundle has already invoked the entry
    /// hook. Completion is single-resolution: exactly one of success or
    /// failure is ever reported per element.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceLoadError`] on transport-level failure (network
    /// or parse error while loading the resource).
    async fn attach_script(&self, element: ScriptElement) -> Result<(), ResourceLoadError>;

    /// Remove every attached script element whose id starts with `prefix`.
    /// Teardown support.
    fn remove_scripts_with_prefix(&self, prefix: &str);

    /// Currently attached script elements, for diagnostics and assertions.
    fn attached_scripts(&self) -> Vec<ScriptElement>;
}
