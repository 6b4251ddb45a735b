//! Collaborator interfaces for the two engines the bridge coordinates.
//!
//! Both engines are external. The location engine monitors geofenced places
//! and delivers visits on its own thread; the ingestion engine accepts
//! events once its asynchronous startup (identity negotiation, channel
//! registration) has finished. The bridge only ever talks to them through
//! these traits, so tests and demos wire in their own implementations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::types::OutputEvent;
use crate::visit::Visit;

/// Device attribute key under which the named-user id is pushed to the
/// location engine.
pub const ATTR_NAMED_USER_ID: &str = "ua.nameduser.id";

/// Device attribute key under which the channel id is pushed to the
/// location engine.
pub const ATTR_CHANNEL_ID: &str = "ua.channel.id";

/// Associated-identifier key under which the location engine's application
/// instance id is pushed to the ingestion engine.
pub const ATTR_APPLICATION_INSTANCE_ID: &str = "com.urbanairship.gimbal.aii";

/// Error type for collaborator calls
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("location engine error: {0}")]
    Location(String),

    #[error("ingestion engine error: {0}")]
    Ingestion(String),
}

/// Result type for collaborator calls
pub type EngineResult<T> = Result<T, EngineError>;

/// Observer for place-visit boundary events.
pub trait PlaceEventObserver: Send + Sync {
    /// A visit began (region entered).
    fn on_visit_start(&self, visit: &Visit);

    /// A visit ended (region exited).
    fn on_visit_end(&self, visit: &Visit);
}

/// Shared observer handle; subscriptions match on `Arc` identity.
pub type SharedPlaceEventObserver = Arc<dyn PlaceEventObserver>;

/// The location-monitoring engine.
pub trait PlaceMonitor: Send + Sync {
    /// Apply the API key. Must precede `start_monitoring`.
    fn configure(&self, api_key: &str) -> EngineResult<()>;

    /// Begin region monitoring and visit delivery.
    fn start_monitoring(&self) -> EngineResult<()>;

    /// Halt region monitoring.
    fn stop_monitoring(&self) -> EngineResult<()>;

    /// Whether the engine is currently monitoring.
    fn is_monitoring(&self) -> bool;

    /// Register an observer for visit boundary events.
    fn subscribe(&self, observer: SharedPlaceEventObserver);

    /// Unregister a previously subscribed observer.
    fn unsubscribe(&self, observer: &SharedPlaceEventObserver);

    /// Engine-assigned identifier for this application install, once known.
    fn instance_identifier(&self) -> Option<String>;

    /// Push a device attribute into the engine's device profile.
    fn set_device_attribute(&self, key: &str, value: &str) -> EngineResult<()>;
}

/// Lifecycle phase of the ingestion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionPhase {
    /// Startup has not begun.
    Uninitialized,
    /// Startup is underway; submitted events are already accepted.
    TakingOff,
    /// Fully operational.
    Operational,
    /// Shutting down; events are no longer accepted.
    ShuttingDown,
}

impl IngestionPhase {
    /// Whether events submitted in this phase will be accepted.
    pub fn accepts_events(self) -> bool {
        matches!(self, Self::TakingOff | Self::Operational)
    }
}

impl std::fmt::Display for IngestionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::TakingOff => write!(f, "taking_off"),
            Self::Operational => write!(f, "operational"),
            Self::ShuttingDown => write!(f, "shutting_down"),
        }
    }
}

/// Handle for a registered channel-identity hook.
pub type HookId = u64;

/// Readiness continuation. Registered once per start; the engine fires it
/// when it reaches a ready phase (immediately if already there). Spurious
/// firings are allowed — the bridge's handler re-checks readiness.
pub type ReadyCallback = Box<dyn Fn() + Send + Sync>;

/// Channel-identity hook, invoked with the new channel id on creation or
/// rotation.
pub type ChannelHook = Box<dyn Fn(&str) + Send + Sync>;

/// The analytics event-ingestion engine.
pub trait IngestionEngine: Send + Sync {
    /// Current lifecycle phase. A query error is treated as not-ready by
    /// callers.
    fn phase(&self) -> EngineResult<IngestionPhase>;

    /// Attach a readiness continuation.
    fn on_ready(&self, callback: ReadyCallback);

    /// Hand an event to the engine's delivery pipeline. Acceptance here is
    /// hand-off only; transport and retry are the engine's concern.
    fn submit(&self, event: &OutputEvent) -> EngineResult<()>;

    /// Registered delivery endpoint id, once the channel exists.
    fn channel_id(&self) -> Option<String>;

    /// Named-user id, if one is set.
    fn named_user_id(&self) -> Option<String>;

    /// Subscribe to channel creation/rotation.
    fn on_channel_identity_changed(&self, hook: ChannelHook) -> HookId;

    /// Unregister a hook returned by `on_channel_identity_changed`.
    fn remove_channel_hook(&self, hook: HookId);

    /// Associate an identifier with the engine's analytics profile.
    fn set_associated_identifier(&self, key: &str, value: &str) -> EngineResult<()>;
}

/// Permission-prompt collaborator.
pub trait PermissionRequester: Send + Sync {
    /// Whether the monitoring permission is currently granted.
    fn is_granted(&self) -> bool;

    /// Prompt the user; the callback receives the grant outcome.
    fn request(&self, callback: Box<dyn FnOnce(bool) + Send>);
}
