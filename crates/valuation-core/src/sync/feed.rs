//! Change feed for live report subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Something changed in the report store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ReportEvent {
    /// Live index fields were written
    Synced {
        vehicle_id: String,
        report_number: String,
    },
    /// An explicit save finalized the report
    Saved {
        vehicle_id: String,
        report_number: String,
        history_id: String,
    },
}

impl ReportEvent {
    pub fn vehicle_id(&self) -> &str {
        match self {
            ReportEvent::Synced { vehicle_id, .. } | ReportEvent::Saved { vehicle_id, .. } => {
                vehicle_id
            }
        }
    }
}

/// Broadcast of [`ReportEvent`]s. Cheap to clone; clones share subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ReportEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers. Events with no subscribers are dropped.
    pub fn publish(&self, event: ReportEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("report event had no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.tx.subscribe()
    }
}
