//! Shared test utilities for the Atrium dynamic-plugin host.
//!
//! Mock collaborators and manifest fixtures used across crates as a
//! dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! atrium-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use atrium_test::{InMemoryExtensionStore, MockResourceHost, manifest};
//!
//! let hooks = Arc::new(EntryHookRegistry::new());
//! let host = MockResourceHost::new(Arc::clone(&hooks))
//!     .with_entry("demo@1.0.0".parse().unwrap(), module);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

/// Install a tracing subscriber for test output. Safe to call from every
/// test; only the first call wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
