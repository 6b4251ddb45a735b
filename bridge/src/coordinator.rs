//! Lifecycle coordination between the place monitor and the ingestion engine.
//!
//! The coordinator owns the start/stop/restore state machine, the place
//! event subscription, and the readiness continuation. Visits that arrive
//! before the ingestion engine is ready are buffered and drained in capture
//! order when readiness is reached; every forwarded event fans out to the
//! registered listeners after a successful hand-off.
//!
//! Nothing here propagates an error past the public boundary: collaborator
//! failures are logged and surface only as `start`/`is_started` returning
//! false or as omitted events.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::buffer::VisitBuffer;
use crate::engines::{
    HookId, IngestionEngine, PermissionRequester, PlaceEventObserver, PlaceMonitor,
    SharedPlaceEventObserver, ATTR_APPLICATION_INSTANCE_ID, ATTR_CHANNEL_ID, ATTR_NAMED_USER_ID,
};
use crate::events::translator::translate;
use crate::events::types::OutputEvent;
use crate::listeners::{ListenerRegistry, SharedListener};
use crate::store::{Preferences, SharedPreferenceStore};
use crate::visit::{BoundaryKind, Visit};

/// Mutable lifecycle state guarded by the state mutex, which also
/// serializes persisted-state writes belonging to a transition.
#[derive(Default)]
struct Lifecycle {
    started: bool,
    observer: Option<SharedPlaceEventObserver>,
    channel_hook: Option<HookId>,
}

struct Inner {
    prefs: Preferences,
    monitor: Arc<dyn PlaceMonitor>,
    ingestion: Arc<dyn IngestionEngine>,
    permissions: Arc<dyn PermissionRequester>,
    buffer: VisitBuffer,
    listeners: ListenerRegistry,
    state: Mutex<Lifecycle>,
    /// Serializes the route decision (ready → forward, not ready → buffer)
    /// against the drain pass, so a visit that observed not-ready can never
    /// land behind a completed drain and be stranded.
    delivery_gate: Mutex<()>,
}

/// Coordinates the place monitor and the ingestion engine.
///
/// Cheap to clone; construct one per process and inject it wherever it is
/// needed. Call [`BridgeCoordinator::restore`] once at process init before
/// trusting the lifecycle state.
#[derive(Clone)]
pub struct BridgeCoordinator {
    inner: Arc<Inner>,
}

/// Observer handed to the place monitor; routes visits into the bridge on
/// the monitor's delivery thread.
struct VisitRouter {
    inner: Weak<Inner>,
}

impl PlaceEventObserver for VisitRouter {
    fn on_visit_start(&self, visit: &Visit) {
        if let Some(inner) = self.inner.upgrade() {
            info!(place = %visit.place.name, arrival = %visit.arrival, "Entered place");
            Inner::route(&inner, visit, BoundaryKind::Enter);
        }
    }

    fn on_visit_end(&self, visit: &Visit) {
        if let Some(inner) = self.inner.upgrade() {
            info!(
                place = %visit.place.name,
                arrival = %visit.arrival,
                departure = ?visit.departure,
                "Exited place"
            );
            Inner::route(&inner, visit, BoundaryKind::Exit);
        }
    }
}

impl BridgeCoordinator {
    /// Create a coordinator over the given collaborators.
    pub fn new(
        store: SharedPreferenceStore,
        monitor: Arc<dyn PlaceMonitor>,
        ingestion: Arc<dyn IngestionEngine>,
        permissions: Arc<dyn PermissionRequester>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                prefs: Preferences::new(store),
                monitor,
                ingestion,
                permissions,
                buffer: VisitBuffer::new(),
                listeners: ListenerRegistry::new(),
                state: Mutex::new(Lifecycle::default()),
                delivery_gate: Mutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the bridge with the given API key.
    ///
    /// Returns the resulting started state. A blank key is rejected without
    /// any state change; a different key while already started is persisted
    /// for the next process start but does not restart the running monitor
    /// session.
    pub fn start(&self, api_key: &str) -> bool {
        self.start_inner(api_key);
        self.is_started()
    }

    /// Request the monitoring permission, then start on grant.
    ///
    /// The optional callback receives the resulting started state once the
    /// prompt resolves.
    pub fn start_with_permission_prompt(
        &self,
        api_key: &str,
        on_complete: Option<Box<dyn FnOnce(bool) + Send>>,
    ) {
        let this = self.clone();
        let api_key = api_key.to_string();
        self.inner.permissions.request(Box::new(move |granted| {
            let started = if granted {
                this.start(&api_key)
            } else {
                warn!("Monitoring permission denied; bridge not started");
                this.is_started()
            };
            if let Some(callback) = on_complete {
                callback(started);
            }
        }));
    }

    /// Whether the monitoring permission is currently granted.
    pub fn is_permission_granted(&self) -> bool {
        self.inner.permissions.is_granted()
    }

    /// Stop the bridge. A stop while already stopped is a logged no-op.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if !state.started {
            warn!("stop() called when bridge was not started");
            return;
        }

        // Persisted first: even if a collaborator fails below, the next
        // process start must not resurrect monitoring the host turned off.
        self.inner.prefs.set_started(false);

        match self.inner.monitor.stop_monitoring() {
            Ok(()) => {
                if let Some(observer) = state.observer.take() {
                    self.inner.monitor.unsubscribe(&observer);
                }
                if let Some(hook) = state.channel_hook.take() {
                    self.inner.ingestion.remove_channel_hook(hook);
                }
                state.started = false;
                info!("Bridge stopped");
            }
            Err(e) => {
                // Still-started in memory: over-buffering beats silently
                // dropping visits the monitor keeps delivering.
                warn!(error = %e, "Failed to stop place monitoring");
            }
        }
    }

    /// Whether the bridge is started and the monitor is actually running.
    pub fn is_started(&self) -> bool {
        self.inner.state.lock().started && self.inner.monitor.is_monitoring()
    }

    /// Restore the last persisted run state.
    ///
    /// If the bridge was started when the process last ran, this re-runs the
    /// start transition with the persisted key. Call once at process init,
    /// before place events need to be attributed; safe to call again.
    pub fn restore(&self) {
        let state = self.inner.prefs.adapter_state();
        let Some(api_key) = state.api_key else {
            debug!("No persisted API key; nothing to restore");
            return;
        };
        if !state.started {
            debug!("Bridge was not started last run; nothing to restore");
            return;
        }

        info!("Restoring bridge from persisted state");
        self.start_inner(&api_key);
        if self.is_started() {
            info!("Bridge restored");
        } else {
            error!("Failed to restore bridge");
        }
    }

    // =========================================================================
    // Listeners and toggles
    // =========================================================================

    /// Register a listener for forwarded events.
    pub fn add_listener(&self, listener: SharedListener) {
        self.inner.listeners.add(listener);
    }

    /// Remove a previously registered listener.
    pub fn remove_listener(&self, listener: &SharedListener) {
        self.inner.listeners.remove(listener);
    }

    /// Toggle region boundary events.
    pub fn set_track_region_events(&self, enabled: bool) {
        self.inner.prefs.set_track_region_events(enabled);
    }

    /// Toggle the custom event on place entry.
    pub fn set_track_custom_entry_events(&self, enabled: bool) {
        self.inner.prefs.set_track_custom_entry_events(enabled);
    }

    /// Toggle the custom event on place exit.
    pub fn set_track_custom_exit_events(&self, enabled: bool) {
        self.inner.prefs.set_track_custom_exit_events(enabled);
    }

    /// Number of visits waiting for the ingestion engine to become ready.
    pub fn pending_visits(&self) -> usize {
        self.inner.buffer.len()
    }

    // =========================================================================
    // Start transition
    // =========================================================================

    fn start_inner(&self, api_key: &str) {
        if api_key.trim().is_empty() {
            warn!("Rejecting blank API key");
            return;
        }

        {
            let mut state = self.inner.state.lock();
            if state.started {
                // Deferred rekey: the running monitor session keeps its key;
                // a changed key takes effect at the next process start.
                match self.inner.prefs.api_key() {
                    Some(current) if current == api_key => {
                        debug!("start() with the active API key; nothing to do");
                    }
                    _ => {
                        info!("API key changed while started; persisted for the next start");
                        self.inner.prefs.set_api_key(api_key);
                    }
                }
                return;
            }

            // Persisted optimistically before the collaborators run: if the
            // monitor fails to start now, the next restore() retries.
            self.inner.prefs.set_api_key(api_key);
            self.inner.prefs.set_started(true);

            if let Err(e) = self
                .inner
                .monitor
                .configure(api_key)
                .and_then(|()| self.inner.monitor.start_monitoring())
            {
                error!(error = %e, "Failed to start place monitoring");
                return;
            }

            let observer: SharedPlaceEventObserver = Arc::new(VisitRouter {
                inner: Arc::downgrade(&self.inner),
            });
            self.inner.monitor.subscribe(Arc::clone(&observer));
            state.observer = Some(observer);
            state.started = true;

            info!(
                monitoring = self.inner.monitor.is_monitoring(),
                instance = ?self.inner.monitor.instance_identifier(),
                "Bridge started"
            );
        }

        // Registered outside the state lock: an engine that is already ready
        // fires the continuation on this thread, and the handler takes the
        // state lock itself.
        let weak = Arc::downgrade(&self.inner);
        self.inner.ingestion.on_ready(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Inner::on_ingestion_ready(&inner);
            }
        }));
    }
}

impl Inner {
    /// Readiness oracle: a failed phase query counts as not-ready.
    fn is_ready(&self) -> bool {
        match self.ingestion.phase() {
            Ok(phase) => phase.accepts_events(),
            Err(e) => {
                warn!(error = %e, "Readiness query failed; treating engine as not ready");
                false
            }
        }
    }

    /// Route one boundary event: forward when ready, buffer otherwise.
    fn route(inner: &Arc<Self>, visit: &Visit, kind: BoundaryKind) {
        let _gate = inner.delivery_gate.lock();
        if inner.is_ready() {
            Self::forward(inner, visit, kind);
        } else {
            inner.buffer.capture(visit.clone(), kind);
        }
    }

    /// Readiness continuation: sync identities, hook channel changes, drain.
    fn on_ingestion_ready(inner: &Arc<Self>) {
        // Stale firings exist in the wild; re-check both sides before acting.
        let started = inner.state.lock().started;
        if !started || !inner.is_ready() {
            warn!("Readiness callback fired while bridge or engine is not ready");
            return;
        }

        Self::sync_identity_attributes(inner);

        let weak = Arc::downgrade(inner);
        let hook = inner.ingestion.on_channel_identity_changed(Box::new(move |channel_id| {
            if let Some(inner) = weak.upgrade() {
                debug!(channel_id, "Channel identity changed; re-syncing attributes");
                Self::sync_identity_attributes(&inner);
            }
        }));
        if let Some(previous) = inner.state.lock().channel_hook.replace(hook) {
            inner.ingestion.remove_channel_hook(previous);
        }

        Self::drain(inner);
    }

    /// Push identity attributes in both directions. Best-effort: each
    /// direction fails independently and only logs.
    fn sync_identity_attributes(inner: &Self) {
        if let Some(named_user) = inner.ingestion.named_user_id() {
            if let Err(e) = inner
                .monitor
                .set_device_attribute(ATTR_NAMED_USER_ID, &named_user)
            {
                warn!(error = %e, "Failed to push named-user id to the place monitor");
            }
        }

        if let Some(channel) = inner.ingestion.channel_id() {
            if let Err(e) = inner.monitor.set_device_attribute(ATTR_CHANNEL_ID, &channel) {
                warn!(error = %e, "Failed to push channel id to the place monitor");
            }
        }

        if let Some(instance) = inner.monitor.instance_identifier() {
            if let Err(e) = inner
                .ingestion
                .set_associated_identifier(ATTR_APPLICATION_INSTANCE_ID, &instance)
            {
                warn!(error = %e, "Failed to push instance id to the ingestion engine");
            }
        }
    }

    /// Flush the buffer in capture order through the forward path.
    fn drain(inner: &Arc<Self>) {
        let _gate = inner.delivery_gate.lock();
        let pending = inner.buffer.drain_all();
        if pending.is_empty() {
            return;
        }

        info!(count = pending.len(), "Draining buffered visits");
        for entry in pending {
            Self::forward(inner, &entry.visit, entry.kind);
        }
    }

    /// Translate one boundary event and hand the results to the ingestion
    /// engine, notifying listeners after each successful hand-off.
    fn forward(inner: &Arc<Self>, visit: &Visit, kind: BoundaryKind) {
        if !inner.is_ready() {
            warn!("Ingestion engine is not ready; dropping event");
            return;
        }

        let config = inner.prefs.tracking_config();
        for event in translate(visit, kind, &config) {
            if let Err(e) = inner.ingestion.submit(&event) {
                warn!(
                    error = %e,
                    event_type = event.event_type(),
                    "Failed to hand event to the ingestion engine"
                );
                continue;
            }
            inner.notify(&event, visit, kind);
        }
    }

    fn notify(&self, event: &OutputEvent, visit: &Visit, kind: BoundaryKind) {
        let listeners = self.listeners.snapshot();
        for listener in listeners.iter() {
            match (event, kind) {
                (OutputEvent::Region(region), BoundaryKind::Enter) => {
                    listener.on_region_entered(region, visit);
                }
                (OutputEvent::Region(region), BoundaryKind::Exit) => {
                    listener.on_region_exited(region, visit);
                }
                (OutputEvent::Custom(custom), BoundaryKind::Enter) => {
                    listener.on_custom_region_entry(custom, visit);
                }
                (OutputEvent::Custom(custom), BoundaryKind::Exit) => {
                    listener.on_custom_region_exit(custom, visit);
                }
            }
        }
    }
}
