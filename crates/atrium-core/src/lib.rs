//! Core types and traits for the Atrium dynamic-plugin host.
//!
//! Provides the domain model shared between the loader and the rest of the
//! host application:
//!
//! - [`PluginName`] / [`PluginId`]: validated plugin identity
//! - [`PluginManifest`]: a plugin's declared metadata, requirements, and extensions
//! - [`ExtensionDeclaration`] / [`ResolvedExtension`]: extension contributions
//!   before and after code-reference resolution
//! - [`PluginModule`]: the namespace a loaded plugin bundle exposes
//! - [`SharedScope`] / [`SharedModuleInit`]: binding a plugin's shared
//!   dependencies to the host's instances
//! - [`ExtensionStore`]: the store that owns registered plugins and their
//!   extensions (consumed by the loader, implemented by the host shell)
//! - [`CodeRefResolver`]: resolution of encoded code references against a
//!   loaded module
//!
//! # Identity
//!
//! A plugin is addressed by its [`PluginId`], `{name}@{version}`, derived
//! deterministically from its manifest. The loader keys all of its state on
//! this id; the *name* alone is what must be unique among concurrently loaded
//! plugins.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod extension;
pub mod manifest;
pub mod module;
pub mod plugin;
pub mod resolve;
pub mod store;

pub use error::{CoreError, CoreResult};
pub use extension::{
    CODE_REF_KEY, ExtensionDeclaration, ResolvedExtension, ResolvedProperty, encoded_code_ref,
};
pub use manifest::{HOST_REQUIREMENT, PluginManifest, PluginRequirement};
pub use module::{
    ExportHandle, PluginModule, SharedModuleInit, SharedScope, SharedScopeError,
    SharedScopeInitializer,
};
pub use plugin::{PluginId, PluginName};
pub use resolve::{CodeRefResolver, DefaultCodeRefResolver};
pub use store::ExtensionStore;
