//! Demo binary for the visit-to-analytics bridge.
//!
//! Wires the bridge to simulated engines and walks through the interesting
//! part of its lifecycle: restore at init, visits buffered while the
//! ingestion engine is still starting, the drain on readiness, and live
//! forwarding afterwards.
//!
//! ```bash
//! bridge-demo --visits 3
//! RUST_LOG=debug bridge-demo --prefs /tmp/bridge-prefs.json
//! ```

mod sim;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::Parser;
use tracing::info;

use bridge::{BridgeCoordinator, BridgeListener, CustomEvent, JsonFileStore, Place, RegionEvent, Visit};
use sim::{SimIngestion, SimMonitor, SimPermissions};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API key handed to the simulated place monitor
    #[arg(long, default_value = "demo-api-key")]
    api_key: String,

    /// Number of scripted visits delivered before the ingestion engine is ready
    #[arg(long, default_value_t = 3)]
    visits: u32,

    /// Path of the JSON preference file
    #[arg(long, default_value = "bridge-prefs.json")]
    prefs: PathBuf,
}

/// Listener that logs every forwarded event.
struct LoggingListener;

impl BridgeListener for LoggingListener {
    fn on_region_entered(&self, event: &RegionEvent, visit: &Visit) {
        info!(region_id = %event.region_id, place = %visit.place.name, "listener: region entered");
    }

    fn on_region_exited(&self, event: &RegionEvent, visit: &Visit) {
        info!(region_id = %event.region_id, place = %visit.place.name, "listener: region exited");
    }

    fn on_custom_region_entry(&self, event: &CustomEvent, visit: &Visit) {
        info!(name = %event.name, place = %visit.place.name, "listener: custom entry");
    }

    fn on_custom_region_exit(&self, event: &CustomEvent, visit: &Visit) {
        info!(name = %event.name, place = %visit.place.name, "listener: custom exit");
    }
}

fn scripted_visit(index: u32) -> Visit {
    Visit {
        visit_id: uuid::Uuid::new_v4().to_string(),
        place: Place::new(format!("place-{index}"), format!("Demo Place {index}"))
            .with_attribute("category", "demo"),
        arrival: Utc::now(),
        departure: None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let store = Arc::new(JsonFileStore::open(&args.prefs)?);
    let monitor = Arc::new(SimMonitor::new());
    let ingestion = Arc::new(SimIngestion::new());
    let bridge = BridgeCoordinator::new(
        store,
        monitor.clone(),
        ingestion.clone(),
        Arc::new(SimPermissions),
    );

    // Process init: resume whatever the last run persisted.
    bridge.restore();

    bridge.add_listener(Arc::new(LoggingListener));
    bridge.set_track_region_events(true);
    bridge.set_track_custom_entry_events(true);
    bridge.set_track_custom_exit_events(true);

    if !bridge.start(&args.api_key) {
        anyhow::bail!("bridge failed to start");
    }

    // The ingestion engine is still starting: everything lands in the buffer.
    for index in 0..args.visits {
        let visit = scripted_visit(index);
        monitor.deliver_visit_start(&visit);

        let mut closed = visit;
        closed.departure = Some(closed.arrival + Duration::seconds(90));
        monitor.deliver_visit_end(&closed);
    }
    info!(
        pending = bridge.pending_visits(),
        "Visits buffered while the ingestion engine starts"
    );

    ingestion.become_ready();
    info!(pending = bridge.pending_visits(), "Buffer drained");

    // A visit after readiness flows straight through.
    let live = scripted_visit(args.visits);
    monitor.deliver_visit_start(&live);

    bridge.stop();
    Ok(())
}
