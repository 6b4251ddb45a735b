//! Pure translation from a visit plus boundary kind into output events.

use super::types::{
    CustomEvent, OutputEvent, RegionEvent, CUSTOM_ENTRY_EVENT_NAME, CUSTOM_EXIT_EVENT_NAME,
    EVENT_SOURCE, PLACE_ATTRIBUTE_PREFIX,
};
use crate::store::TrackingConfig;
use crate::visit::{BoundaryKind, Visit};

/// Translate a visit boundary into the events the current toggles call for.
///
/// Each toggle is evaluated independently, so a single boundary may produce
/// zero, one, or two events. When both a region and a custom event fire, the
/// region event comes first.
pub fn translate(visit: &Visit, kind: BoundaryKind, config: &TrackingConfig) -> Vec<OutputEvent> {
    let mut events = Vec::new();

    match kind {
        BoundaryKind::Enter => {
            if config.track_region_events {
                events.push(OutputEvent::Region(region_event(visit, kind)));
            }
            if config.track_custom_entry_events {
                events.push(OutputEvent::Custom(custom_event(
                    CUSTOM_ENTRY_EVENT_NAME,
                    visit,
                    kind,
                )));
            }
        }
        BoundaryKind::Exit => {
            if config.track_region_events {
                events.push(OutputEvent::Region(region_event(visit, kind)));
            }
            if config.track_custom_exit_events {
                events.push(OutputEvent::Custom(custom_event(
                    CUSTOM_EXIT_EVENT_NAME,
                    visit,
                    kind,
                )));
            }
        }
    }

    events
}

fn region_event(visit: &Visit, kind: BoundaryKind) -> RegionEvent {
    RegionEvent::new(kind, visit.place.identifier.clone())
}

fn custom_event(name: &str, visit: &Visit, kind: BoundaryKind) -> CustomEvent {
    let event = base_custom_event(name, visit, kind);
    match kind {
        BoundaryKind::Enter => event,
        // Fractional seconds are truncated, not rounded.
        BoundaryKind::Exit => event.with_property("dwellTimeInSeconds", visit.dwell_millis() / 1000),
    }
}

fn base_custom_event(name: &str, visit: &Visit, kind: BoundaryKind) -> CustomEvent {
    let mut event = CustomEvent::new(name);
    for (key, value) in &visit.place.attributes {
        event = event.with_property(format!("{PLACE_ATTRIBUTE_PREFIX}{key}"), value.as_str());
    }

    event
        .with_property("visitID", visit.visit_id.as_str())
        .with_property("placeIdentifier", visit.place.identifier.as_str())
        .with_property("placeName", visit.place.name.as_str())
        .with_property("source", EVENT_SOURCE)
        .with_property("boundaryEvent", kind.code())
}
