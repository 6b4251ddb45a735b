//! Event shapes handed to the ingestion engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::visit::BoundaryKind;

/// Source tag attached to every event the bridge produces.
pub const EVENT_SOURCE: &str = "Gimbal";

/// Name of the custom event emitted on place entry.
pub const CUSTOM_ENTRY_EVENT_NAME: &str = "gimbal_custom_entry_event";

/// Name of the custom event emitted on place exit.
pub const CUSTOM_EXIT_EVENT_NAME: &str = "gimbal_custom_exit_event";

/// Prefix under which place attributes appear in custom-event properties.
pub const PLACE_ATTRIBUTE_PREFIX: &str = "GMBL_PA_";

/// A region boundary event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEvent {
    /// Which boundary was crossed.
    pub boundary: BoundaryKind,
    /// Event source tag.
    pub source: String,
    /// Identifier of the region (the place identifier).
    pub region_id: String,
}

impl RegionEvent {
    pub fn new(boundary: BoundaryKind, region_id: impl Into<String>) -> Self {
        Self {
            boundary,
            source: EVENT_SOURCE.to_string(),
            region_id: region_id.into(),
        }
    }
}

/// A named event with free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    /// Event name.
    pub name: String,
    /// Property map; values are strings or numbers.
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// An event produced by the translator, ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Region(RegionEvent),
    Custom(CustomEvent),
}

impl OutputEvent {
    /// Get the event shape as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Region(_) => "region",
            Self::Custom(_) => "custom",
        }
    }

    pub fn as_region(&self) -> Option<&RegionEvent> {
        match self {
            Self::Region(event) => Some(event),
            Self::Custom(_) => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomEvent> {
        match self {
            Self::Custom(event) => Some(event),
            Self::Region(_) => None,
        }
    }
}
