//! In-process simulated engines for the demo.
//!
//! The simulated monitor delivers scripted visits to its subscribers; the
//! simulated ingestion engine starts uninitialized and flips to operational
//! when told to, firing its readiness continuations like the real thing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::info;

use bridge::engines::{
    ChannelHook, EngineResult, HookId, IngestionEngine, IngestionPhase, PermissionRequester,
    PlaceMonitor, ReadyCallback, SharedPlaceEventObserver,
};
use bridge::events::types::OutputEvent;
use bridge::visit::Visit;

/// Simulated location engine.
#[derive(Default)]
pub struct SimMonitor {
    monitoring: AtomicBool,
    observers: Mutex<Vec<SharedPlaceEventObserver>>,
}

impl SimMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a visit start to every subscriber.
    pub fn deliver_visit_start(&self, visit: &Visit) {
        for observer in self.observers.lock().clone() {
            observer.on_visit_start(visit);
        }
    }

    /// Deliver a visit end to every subscriber.
    pub fn deliver_visit_end(&self, visit: &Visit) {
        for observer in self.observers.lock().clone() {
            observer.on_visit_end(visit);
        }
    }
}

impl PlaceMonitor for SimMonitor {
    fn configure(&self, api_key: &str) -> EngineResult<()> {
        info!(api_key, "Sim monitor configured");
        Ok(())
    }

    fn start_monitoring(&self) -> EngineResult<()> {
        self.monitoring.store(true, Ordering::SeqCst);
        info!("Sim monitor started");
        Ok(())
    }

    fn stop_monitoring(&self) -> EngineResult<()> {
        self.monitoring.store(false, Ordering::SeqCst);
        info!("Sim monitor stopped");
        Ok(())
    }

    fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    fn subscribe(&self, observer: SharedPlaceEventObserver) {
        self.observers.lock().push(observer);
    }

    fn unsubscribe(&self, observer: &SharedPlaceEventObserver) {
        self.observers
            .lock()
            .retain(|existing| !std::sync::Arc::ptr_eq(existing, observer));
    }

    fn instance_identifier(&self) -> Option<String> {
        Some("sim-instance-0001".to_string())
    }

    fn set_device_attribute(&self, key: &str, value: &str) -> EngineResult<()> {
        info!(key, value, "Sim monitor device attribute set");
        Ok(())
    }
}

/// Simulated ingestion engine with a scripted readiness transition.
pub struct SimIngestion {
    phase: Mutex<IngestionPhase>,
    ready_callbacks: Mutex<Vec<ReadyCallback>>,
    hooks: Mutex<HashMap<HookId, ChannelHook>>,
    next_hook_id: AtomicU64,
}

impl SimIngestion {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(IngestionPhase::Uninitialized),
            ready_callbacks: Mutex::new(Vec::new()),
            hooks: Mutex::new(HashMap::new()),
            next_hook_id: AtomicU64::new(1),
        }
    }

    /// Finish the simulated startup and fire the readiness continuations.
    pub fn become_ready(&self) {
        *self.phase.lock() = IngestionPhase::Operational;
        info!("Sim ingestion engine is now operational");
        for callback in self.ready_callbacks.lock().iter() {
            callback();
        }
    }
}

impl IngestionEngine for SimIngestion {
    fn phase(&self) -> EngineResult<IngestionPhase> {
        Ok(*self.phase.lock())
    }

    fn on_ready(&self, callback: ReadyCallback) {
        let ready = self.phase.lock().accepts_events();
        if ready {
            callback();
        }
        self.ready_callbacks.lock().push(callback);
    }

    fn submit(&self, event: &OutputEvent) -> EngineResult<()> {
        match event {
            OutputEvent::Region(region) => info!(
                boundary = %region.boundary,
                region_id = %region.region_id,
                "Sim ingestion accepted region event"
            ),
            OutputEvent::Custom(custom) => info!(
                name = %custom.name,
                properties = custom.properties.len(),
                "Sim ingestion accepted custom event"
            ),
        }
        Ok(())
    }

    fn channel_id(&self) -> Option<String> {
        Some("sim-channel-0001".to_string())
    }

    fn named_user_id(&self) -> Option<String> {
        None
    }

    fn on_channel_identity_changed(&self, hook: ChannelHook) -> HookId {
        let id = self.next_hook_id.fetch_add(1, Ordering::SeqCst);
        self.hooks.lock().insert(id, hook);
        id
    }

    fn remove_channel_hook(&self, hook: HookId) {
        self.hooks.lock().remove(&hook);
    }

    fn set_associated_identifier(&self, key: &str, value: &str) -> EngineResult<()> {
        info!(key, value, "Sim ingestion associated identifier set");
        Ok(())
    }
}

/// Permission collaborator that always grants.
pub struct SimPermissions;

impl PermissionRequester for SimPermissions {
    fn is_granted(&self) -> bool {
        true
    }

    fn request(&self, callback: Box<dyn FnOnce(bool) + Send>) {
        callback(true);
    }
}
