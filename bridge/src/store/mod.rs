//! Durable preference store and the typed bridge preferences facade.
//!
//! The store itself is an external collaborator: an opaque string/bool
//! key/value store that survives process restarts. `Preferences` layers the
//! bridge's persisted state on top of it — the API key, the started flag,
//! and the three tracking toggles.

pub mod file;
pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Persisted key for the location-engine API key.
const API_KEY: &str = "api_key";
/// Persisted key for the started flag.
const IS_STARTED: &str = "is_started";
/// Persisted key for the region-event toggle.
const TRACK_REGION_EVENTS: &str = "track_region_events";
/// Persisted key for the custom-entry-event toggle.
const TRACK_CUSTOM_ENTRY_EVENTS: &str = "track_custom_entry_events";
/// Persisted key for the custom-exit-event toggle.
const TRACK_CUSTOM_EXIT_EVENTS: &str = "track_custom_exit_events";

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque durable string/bool store surviving process restarts.
///
/// Writes are fire-and-forget: implementations log failures rather than
/// propagating them, because nothing above the store can throw past the
/// bridge's public boundary.
pub trait PreferenceStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
    fn put_string(&self, key: &str, value: &str);
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn put_bool(&self, key: &str, value: bool);
    fn remove(&self, key: &str);
}

/// Shared reference to a preference store
pub type SharedPreferenceStore = Arc<dyn PreferenceStore>;

/// Tracking toggles read on every forward decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Emit region boundary events.
    pub track_region_events: bool,
    /// Emit a custom event on place entry.
    pub track_custom_entry_events: bool,
    /// Emit a custom event on place exit.
    pub track_custom_exit_events: bool,
}

impl TrackingConfig {
    /// Whether any toggle is set.
    pub fn any(&self) -> bool {
        self.track_region_events || self.track_custom_entry_events || self.track_custom_exit_events
    }
}

/// Persisted lifecycle state, the single source of truth for `restore`.
///
/// Invariant: `started` implies a non-empty key was present at the last
/// successful start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterState {
    pub api_key: Option<String>,
    pub started: bool,
}

/// Typed facade over the preference store for the bridge's persisted state.
#[derive(Clone)]
pub struct Preferences {
    store: SharedPreferenceStore,
}

impl Preferences {
    pub fn new(store: SharedPreferenceStore) -> Self {
        Self { store }
    }

    /// API key recorded at the last start, if any.
    pub fn api_key(&self) -> Option<String> {
        self.store.get_string(API_KEY)
    }

    pub fn set_api_key(&self, key: &str) {
        self.store.put_string(API_KEY, key);
    }

    /// Whether the bridge was started when the process last ran.
    pub fn started(&self) -> bool {
        self.store.get_bool(IS_STARTED, false)
    }

    pub fn set_started(&self, started: bool) {
        self.store.put_bool(IS_STARTED, started);
    }

    /// Persisted lifecycle state as one record.
    pub fn adapter_state(&self) -> AdapterState {
        AdapterState {
            api_key: self.api_key(),
            started: self.started(),
        }
    }

    /// Current tracking toggles; every toggle defaults to off.
    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            track_region_events: self.store.get_bool(TRACK_REGION_EVENTS, false),
            track_custom_entry_events: self.store.get_bool(TRACK_CUSTOM_ENTRY_EVENTS, false),
            track_custom_exit_events: self.store.get_bool(TRACK_CUSTOM_EXIT_EVENTS, false),
        }
    }

    pub fn set_track_region_events(&self, enabled: bool) {
        self.store.put_bool(TRACK_REGION_EVENTS, enabled);
    }

    pub fn set_track_custom_entry_events(&self, enabled: bool) {
        self.store.put_bool(TRACK_CUSTOM_ENTRY_EVENTS, enabled);
    }

    pub fn set_track_custom_exit_events(&self, enabled: bool) {
        self.store.put_bool(TRACK_CUSTOM_EXIT_EVENTS, enabled);
    }
}
