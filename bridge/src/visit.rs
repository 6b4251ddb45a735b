//! Visit data model consumed from the place-monitoring engine.
//!
//! Visits are produced and owned by the location engine; the bridge holds
//! them only long enough to translate or buffer. The boundary kind is fixed
//! at observation time because an open visit keeps changing (departure and
//! dwell fill in later) while it waits in the buffer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geofenced place known to the location engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Stable place identifier.
    pub identifier: String,
    /// Human-readable place name.
    pub name: String,
    /// Free-form attributes attached to the place.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Place {
    /// Create a place with no attributes.
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Attach an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A dwell at a geofenced place, from arrival until (eventual) departure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Identifier for this visit, assigned by the location engine.
    pub visit_id: String,
    /// The place being visited.
    pub place: Place,
    /// Arrival time.
    pub arrival: DateTime<Utc>,
    /// Departure time; `None` while the visit is still open.
    pub departure: Option<DateTime<Utc>>,
}

impl Visit {
    /// Dwell duration in milliseconds; 0 while the visit is still open.
    pub fn dwell_millis(&self) -> i64 {
        match self.departure {
            Some(departure) => (departure - self.arrival).num_milliseconds(),
            None => 0,
        }
    }
}

/// Boundary transition of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// The device arrived at the place.
    Enter,
    /// The device left the place.
    Exit,
}

impl BoundaryKind {
    /// Numeric wire code carried in custom-event properties.
    pub fn code(self) -> u8 {
        match self {
            Self::Enter => 1,
            Self::Exit => 2,
        }
    }
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// A visit paired with the boundary kind observed at capture time.
///
/// Created when a visit arrives while the ingestion engine is not ready,
/// consumed exactly once at drain time.
#[derive(Debug, Clone)]
pub struct BufferedVisit {
    pub visit: Visit,
    pub kind: BoundaryKind,
}
