//! Dynamic plugin loading for the Atrium console host.
//!
//! A dynamic plugin ships a manifest and a remote entry bundle. Activating
//! one walks a strict pipeline:
//!
//! 1. fetch the manifest from the plugin gateway,
//! 2. resolve its declared requirements against the host release version and
//!    the store's allow-list,
//! 3. inject the entry bundle and wait for it to register itself through the
//!    process-wide entry hook,
//! 4. enable the plugin in the extension store.
//!
//! The pieces:
//!
//! - [`PendingPluginRegistry`]: which plugins have an outstanding or
//!   completed injection, and whether their entry callback fired
//! - [`ScriptInjector`]: builds the cache-busted entry URL and attaches the
//!   script element via a [`ResourceHost`]
//! - [`EntryCallbackHandler`]: invoked (through the [`EntryHookRegistry`])
//!   by the bundle's own bootstrap code; resolves code references and hands
//!   the result to the extension store
//! - [`PluginLoader`]: wires the above and drives [`PluginLoader::activate`]
//!
//! # Failure model
//!
//! Activation-stage errors are terminal for the attempt and reported through
//! the caller's reporter; they are never retried here. Failures inside the
//! entry callback are absorbed and logged — there is no awaiting caller on
//! that side of the hook boundary — leaving the plugin registered but inert.
//! A load that got past the duplicate check keeps its registry record and
//! its script element even on failure; re-activating the same name requires
//! [`PluginLoader::reset`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod config;
pub mod dependencies;
pub mod entry;
pub mod error;
pub mod hook;
pub mod host;
pub mod injector;
pub mod loader;
pub mod manifest_client;
pub mod registry;

pub use config::LoaderConfig;
pub use dependencies::{DependencyError, DependencyResolver, SemverDependencyResolver};
pub use entry::EntryCallbackHandler;
pub use error::{LoadResult, PluginLoadError, ResourceLoadError};
pub use hook::{EntryHookRegistry, PLUGIN_ENTRY_HOOK, PluginEntryHook};
pub use host::{ResourceHost, ScriptElement};
pub use injector::{CACHE_BUSTER_PARAM, PLUGIN_ENTRY_FILE, SCRIPT_ELEMENT_PREFIX, ScriptInjector};
pub use loader::{PluginLoader, PluginLoaderBuilder};
pub use manifest_client::{HttpManifestClient, ManifestClient, ManifestError};
pub use registry::{PendingPluginRegistry, PluginLoadSnapshot};
