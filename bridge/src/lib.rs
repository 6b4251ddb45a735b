//! Visit-to-analytics bridge
//!
//! Coordinates two independently-initialized engines: a place-monitoring
//! engine that emits visit boundary events and an analytics ingestion
//! engine that only accepts events after its own asynchronous startup has
//! completed.
//!
//! The bridge:
//! - buffers visits observed before the ingestion engine is ready and
//!   drains them exactly once, in capture order, when readiness is reached
//! - translates each visit boundary into region and custom events per the
//!   persisted tracking toggles
//! - fans every forwarded event out to registered listeners without
//!   blocking the producer
//! - persists its start/stop state so `restore()` can resume monitoring
//!   after a process restart
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge::{BridgeCoordinator, JsonFileStore};
//!
//! let store = Arc::new(JsonFileStore::open("bridge-prefs.json")?);
//! let bridge = BridgeCoordinator::new(store, monitor, ingestion, permissions);
//!
//! bridge.restore(); // process init, before any visit needs attributing
//! bridge.set_track_region_events(true);
//! bridge.add_listener(Arc::new(MyListener));
//! bridge.start("place-api-key");
//! ```

pub mod buffer;
pub mod coordinator;
pub mod engines;
pub mod events;
pub mod listeners;
pub mod store;
pub mod visit;

// Re-export the public surface
pub use buffer::VisitBuffer;
pub use coordinator::BridgeCoordinator;
pub use engines::{
    ChannelHook, EngineError, EngineResult, HookId, IngestionEngine, IngestionPhase,
    PermissionRequester, PlaceEventObserver, PlaceMonitor, ReadyCallback,
    SharedPlaceEventObserver,
};
pub use events::translator::translate;
pub use events::types::{CustomEvent, OutputEvent, RegionEvent};
pub use listeners::{BridgeListener, ListenerRegistry, SharedListener};
pub use store::{
    AdapterState, JsonFileStore, MemoryStore, PreferenceStore, Preferences,
    SharedPreferenceStore, StoreError, StoreResult, TrackingConfig,
};
pub use visit::{BoundaryKind, BufferedVisit, Place, Visit};
