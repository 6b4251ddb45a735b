//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use bridge::engines::{
    ChannelHook, EngineError, EngineResult, HookId, IngestionEngine, IngestionPhase,
    PermissionRequester, PlaceMonitor, ReadyCallback, SharedPlaceEventObserver,
};
use bridge::events::types::{CustomEvent, OutputEvent, RegionEvent};
use bridge::listeners::BridgeListener;
use bridge::store::{MemoryStore, SharedPreferenceStore};
use bridge::visit::{Place, Visit};
use bridge::BridgeCoordinator;

// =============================================================================
// Fake location engine
// =============================================================================

#[derive(Default)]
pub struct FakeMonitor {
    monitoring: AtomicBool,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
    configure_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    configured_key: Mutex<Option<String>>,
    observers: Mutex<Vec<SharedPlaceEventObserver>>,
    instance_id: Mutex<Option<String>>,
    attributes: Mutex<HashMap<String, String>>,
}

impl FakeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn set_instance_identifier(&self, id: &str) {
        *self.instance_id.lock() = Some(id.to_string());
    }

    /// Deliver a visit-start to every subscribed observer, as the engine's
    /// delivery thread would.
    pub fn deliver_visit_start(&self, visit: &Visit) {
        for observer in self.observers.lock().clone() {
            observer.on_visit_start(visit);
        }
    }

    /// Deliver a visit-end to every subscribed observer.
    pub fn deliver_visit_end(&self, visit: &Visit) {
        for observer in self.observers.lock().clone() {
            observer.on_visit_end(visit);
        }
    }

    pub fn configured_key(&self) -> Option<String> {
        self.configured_key.lock().clone()
    }

    pub fn configure_calls(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.lock().get(key).cloned()
    }
}

impl PlaceMonitor for FakeMonitor {
    fn configure(&self, api_key: &str) -> EngineResult<()> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(EngineError::Location("configure failed".to_string()));
        }
        *self.configured_key.lock() = Some(api_key.to_string());
        Ok(())
    }

    fn start_monitoring(&self) -> EngineResult<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(EngineError::Location("start failed".to_string()));
        }
        self.monitoring.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_monitoring(&self) -> EngineResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(EngineError::Location("stop failed".to_string()));
        }
        self.monitoring.store(false, Ordering::SeqCst);
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
            .retain(|existing| !Arc::ptr_eq(existing, observer));
    }

    fn instance_identifier(&self) -> Option<String> {
        self.instance_id.lock().clone()
    }

    fn set_device_attribute(&self, key: &str, value: &str) -> EngineResult<()> {
        self.attributes
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Fake ingestion engine
// =============================================================================

pub struct FakeIngestion {
    phase: Mutex<IngestionPhase>,
    fail_submit: AtomicBool,
    fail_phase: AtomicBool,
    submit_attempts: AtomicUsize,
    submitted: Mutex<Vec<OutputEvent>>,
    ready_callbacks: Mutex<Vec<ReadyCallback>>,
    channel: Mutex<Option<String>>,
    named_user: Mutex<Option<String>>,
    hooks: Mutex<HashMap<HookId, ChannelHook>>,
    next_hook_id: AtomicU64,
    associated: Mutex<HashMap<String, String>>,
}

impl FakeIngestion {
    pub fn new(phase: IngestionPhase) -> Self {
        Self {
            phase: Mutex::new(phase),
            fail_submit: AtomicBool::new(false),
            fail_phase: AtomicBool::new(false),
            submit_attempts: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            ready_callbacks: Mutex::new(Vec::new()),
            channel: Mutex::new(None),
            named_user: Mutex::new(None),
            hooks: Mutex::new(HashMap::new()),
            next_hook_id: AtomicU64::new(1),
            associated: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_phase(&self, fail: bool) {
        self.fail_phase.store(fail, Ordering::SeqCst);
    }

    pub fn set_named_user(&self, id: &str) {
        *self.named_user.lock() = Some(id.to_string());
    }

    pub fn set_channel(&self, id: &str) {
        *self.channel.lock() = Some(id.to_string());
    }

    /// Transition to operational and fire every readiness continuation.
    pub fn become_ready(&self) {
        *self.phase.lock() = IngestionPhase::Operational;
        self.fire_ready();
    }

    /// Fire the registered continuations without changing phase — the stale
    /// delivery the bridge has to tolerate.
    pub fn fire_ready(&self) {
        for callback in self.ready_callbacks.lock().iter() {
            callback();
        }
    }

    /// Rotate the channel identity and notify registered hooks.
    pub fn rotate_channel(&self, id: &str) {
        *self.channel.lock() = Some(id.to_string());
        for hook in self.hooks.lock().values() {
            hook(id);
        }
    }

    pub fn submitted(&self) -> Vec<OutputEvent> {
        self.submitted.lock().clone()
    }

    pub fn submit_attempts(&self) -> usize {
        self.submit_attempts.load(Ordering::SeqCst)
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.lock().len()
    }

    pub fn associated(&self, key: &str) -> Option<String> {
        self.associated.lock().get(key).cloned()
    }
}

impl IngestionEngine for FakeIngestion {
    fn phase(&self) -> EngineResult<IngestionPhase> {
        if self.fail_phase.load(Ordering::SeqCst) {
            return Err(EngineError::Ingestion("phase query failed".to_string()));
        }
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
        self.submit_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(EngineError::Ingestion("submit failed".to_string()));
        }
        self.submitted.lock().push(event.clone());
        Ok(())
    }

    fn channel_id(&self) -> Option<String> {
        self.channel.lock().clone()
    }

    fn named_user_id(&self) -> Option<String> {
        self.named_user.lock().clone()
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
        self.associated
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Fake permission collaborator
// =============================================================================

pub struct FakePermissions {
    granted: AtomicBool,
}

impl FakePermissions {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl PermissionRequester for FakePermissions {
    fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request(&self, callback: Box<dyn FnOnce(bool) + Send>) {
        callback(self.granted.load(Ordering::SeqCst));
    }
}

// =============================================================================
// Recording listener
// =============================================================================

#[derive(Default)]
pub struct RecordingListener {
    pub region_enters: Mutex<Vec<(RegionEvent, Visit)>>,
    pub region_exits: Mutex<Vec<(RegionEvent, Visit)>>,
    pub custom_entries: Mutex<Vec<(CustomEvent, Visit)>>,
    pub custom_exits: Mutex<Vec<(CustomEvent, Visit)>>,
}

impl RecordingListener {
    pub fn total_calls(&self) -> usize {
        self.region_enters.lock().len()
            + self.region_exits.lock().len()
            + self.custom_entries.lock().len()
            + self.custom_exits.lock().len()
    }
}

impl BridgeListener for RecordingListener {
    fn on_region_entered(&self, event: &RegionEvent, visit: &Visit) {
        self.region_enters.lock().push((event.clone(), visit.clone()));
    }

    fn on_region_exited(&self, event: &RegionEvent, visit: &Visit) {
        self.region_exits.lock().push((event.clone(), visit.clone()));
    }

    fn on_custom_region_entry(&self, event: &CustomEvent, visit: &Visit) {
        self.custom_entries.lock().push((event.clone(), visit.clone()));
    }

    fn on_custom_region_exit(&self, event: &CustomEvent, visit: &Visit) {
        self.custom_exits.lock().push((event.clone(), visit.clone()));
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub monitor: Arc<FakeMonitor>,
    pub ingestion: Arc<FakeIngestion>,
    pub permissions: Arc<FakePermissions>,
    pub bridge: BridgeCoordinator,
}

/// Build a bridge over fresh fakes with the ingestion engine in `phase`.
pub fn harness(phase: IngestionPhase) -> TestHarness {
    harness_with_store(Arc::new(MemoryStore::new()), phase)
}

/// Build a bridge over an existing store — fresh fakes, so constructing a
/// second harness with the same store simulates a process restart.
pub fn harness_with_store(store: Arc<MemoryStore>, phase: IngestionPhase) -> TestHarness {
    let monitor = Arc::new(FakeMonitor::new());
    let ingestion = Arc::new(FakeIngestion::new(phase));
    let permissions = Arc::new(FakePermissions::new(true));

    let shared: SharedPreferenceStore = store.clone();
    let bridge = BridgeCoordinator::new(
        shared,
        monitor.clone(),
        ingestion.clone(),
        permissions.clone(),
    );

    TestHarness {
        store,
        monitor,
        ingestion,
        permissions,
        bridge,
    }
}

// =============================================================================
// Visit builders
// =============================================================================

/// An open visit (no departure yet) at the given place.
pub fn open_visit(place_id: &str, name: &str) -> Visit {
    Visit {
        visit_id: uuid::Uuid::new_v4().to_string(),
        place: Place::new(place_id, name),
        arrival: Utc::now(),
        departure: None,
    }
}

/// The same visit with a departure `dwell_ms` after arrival.
pub fn with_departure(visit: &Visit, dwell_ms: i64) -> Visit {
    let mut closed = visit.clone();
    closed.departure = Some(closed.arrival + chrono::Duration::milliseconds(dwell_ms));
    closed
}
