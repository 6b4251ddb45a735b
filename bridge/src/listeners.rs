//! Listener registry with copy-on-write snapshots.
//!
//! Mutations replace the backing list, so a notification pass iterating a
//! snapshot is unaffected by concurrent add/remove and never holds a lock
//! while listener code runs.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::types::{CustomEvent, RegionEvent};
use crate::visit::Visit;

/// Observer notified after each successful event hand-off.
///
/// All callbacks default to no-ops so implementations only override the
/// shapes they care about.
pub trait BridgeListener: Send + Sync {
    /// A region enter event was created from a visit.
    fn on_region_entered(&self, _event: &RegionEvent, _visit: &Visit) {}

    /// A region exit event was created from a visit.
    fn on_region_exited(&self, _event: &RegionEvent, _visit: &Visit) {}

    /// A custom entry event was created from a visit.
    fn on_custom_region_entry(&self, _event: &CustomEvent, _visit: &Visit) {}

    /// A custom exit event was created from a visit.
    fn on_custom_region_exit(&self, _event: &CustomEvent, _visit: &Visit) {}
}

/// Shared listener handle. Identity (`Arc::ptr_eq`) is what `remove` matches on.
pub type SharedListener = Arc<dyn BridgeListener>;

/// Thread-safe listener set with snapshot iteration.
///
/// Notification order across listeners is insertion order, but listeners
/// must not rely on ordering relative to each other.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Arc<Vec<SharedListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&self, listener: SharedListener) {
        let mut current = self.listeners.write();
        let mut next = current.as_ref().clone();
        next.push(listener);
        *current = Arc::new(next);
    }

    /// Remove a previously registered listener by identity.
    pub fn remove(&self, listener: &SharedListener) {
        let mut current = self.listeners.write();
        let next: Vec<SharedListener> = current
            .iter()
            .filter(|existing| !Arc::ptr_eq(existing, listener))
            .cloned()
            .collect();
        *current = Arc::new(next);
    }

    /// Immutable snapshot of the current listener set.
    pub fn snapshot(&self) -> Arc<Vec<SharedListener>> {
        Arc::clone(&self.listeners.read())
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Whether any listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}
