//! Pending-load registry.
//!
//! Process-wide map from plugin identifier to in-flight load state: which
//! plugins have an outstanding or completed script injection, and whether
//! their entry callback has fired. The registry is the sole owner of load
//! records; everyone else gets cloned snapshots.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use atrium_core::{PluginId, PluginManifest};

use crate::error::{LoadResult, PluginLoadError};

/// One plugin's in-flight load state.
struct PluginLoadRecord {
    /// Immutable once stored.
    manifest: PluginManifest,
    /// Flips `false → true` exactly once, when the bundle's entry callback
    /// completes.
    entry_callback_fired: bool,
}

/// A cloned view of one load record.
#[derive(Debug, Clone)]
pub struct PluginLoadSnapshot {
    /// The registry key.
    pub plugin_id: PluginId,
    /// The manifest recorded when injection began.
    pub manifest: PluginManifest,
    /// Whether the entry callback has fired.
    pub entry_callback_fired: bool,
}

/// Registry of in-flight and completed plugin loads.
///
/// Records are never removed during normal operation — a plugin is never
/// "unloaded" in this design. [`clear`](Self::clear) exists for test
/// teardown only. All operations take a single lock acquisition; mutations
/// happen on one logical execution context, so the mutex is for `Send`/
/// `Sync` correctness, not contention.
#[derive(Default)]
pub struct PendingPluginRegistry {
    records: Mutex<HashMap<PluginId, PluginLoadRecord>>,
}

impl PendingPluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record state is a plain map and every mutation is a single
    /// assignment, so a panicking holder cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, HashMap<PluginId, PluginLoadRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin tracking a plugin load.
    ///
    /// The duplicate check is by manifest *name*, not identifier: two
    /// versions of the same plugin can never be in flight together. Check
    /// and insert happen under one lock acquisition, so concurrent `begin`
    /// calls for the same name cannot both pass.
    ///
    /// # Errors
    ///
    /// Returns [`PluginLoadError::DuplicatePlugin`] if any record shares
    /// the manifest name.
    pub fn begin(&self, plugin_id: &PluginId, manifest: &PluginManifest) -> LoadResult<()> {
        let mut records = self.lock();
        if records.keys().any(|id| id.name() == plugin_id.name()) {
            return Err(PluginLoadError::DuplicatePlugin(
                plugin_id.name().as_str().to_string(),
            ));
        }
        debug!(plugin_id = %plugin_id, "Recorded pending plugin load");
        records.insert(
            plugin_id.clone(),
            PluginLoadRecord {
                manifest: manifest.clone(),
                entry_callback_fired: false,
            },
        );
        Ok(())
    }

    /// Get a snapshot of a plugin's load record.
    #[must_use]
    pub fn get(&self, plugin_id: &PluginId) -> Option<PluginLoadSnapshot> {
        self.lock().get(plugin_id).map(|record| PluginLoadSnapshot {
            plugin_id: plugin_id.clone(),
            manifest: record.manifest.clone(),
            entry_callback_fired: record.entry_callback_fired,
        })
    }

    /// Set a record's entry-callback flag, returning the flag's previous
    /// value, or `None` if no record exists.
    ///
    /// The registry stays a simple store: "only once" enforcement lives in
    /// the entry callback handler, which uses the returned prior value as
    /// its reentrancy guard.
    pub fn mark_entry_callback_fired(&self, plugin_id: &PluginId) -> Option<bool> {
        let mut records = self.lock();
        let record = records.get_mut(plugin_id)?;
        let previous = record.entry_callback_fired;
        record.entry_callback_fired = true;
        Some(previous)
    }

    /// Snapshots of every record, for diagnostics and test assertions.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PluginLoadSnapshot> {
        self.lock()
            .iter()
            .map(|(plugin_id, record)| PluginLoadSnapshot {
                plugin_id: plugin_id.clone(),
                manifest: record.manifest.clone(),
                entry_callback_fired: record.entry_callback_fired,
            })
            .collect()
    }

    /// Remove all records. Test/teardown only.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of tracked loads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no loads are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl std::fmt::Debug for PendingPluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.lock();
        f.debug_struct("PendingPluginRegistry")
            .field("count", &records.len())
            .field("plugin_ids", &records.keys().collect::<Vec<_>>())
            .finish()
    }
}
