//! Ordered buffer for visits observed before the ingestion engine is ready.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::debug;

use crate::visit::{BoundaryKind, BufferedVisit, Visit};

/// FIFO buffer holding visits until the first drain after readiness.
///
/// `capture` and `drain_all` share one mutex: a drain observes every entry
/// captured before it, and a capture never lands mid-drain in a way that
/// would reorder entries. The buffer is unbounded — it only holds visits
/// across the ingestion engine's brief startup window.
#[derive(Default)]
pub struct VisitBuffer {
    visits: Mutex<VecDeque<BufferedVisit>>,
}

impl VisitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visit with the boundary kind observed right now.
    pub fn capture(&self, visit: Visit, kind: BoundaryKind) {
        let mut visits = self.visits.lock();
        debug!(
            place = %visit.place.name,
            kind = %kind,
            pending = visits.len() + 1,
            "Visit buffered until ingestion engine is ready"
        );
        visits.push_back(BufferedVisit { visit, kind });
    }

    /// Atomically remove and return every entry in capture order.
    pub fn drain_all(&self) -> Vec<BufferedVisit> {
        self.visits.lock().drain(..).collect()
    }

    /// Number of entries currently waiting.
    pub fn len(&self) -> usize {
        self.visits.lock().len()
    }

    /// Whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.visits.lock().is_empty()
    }
}
