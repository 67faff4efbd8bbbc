//! In-process change notifications.
//!
//! The dashboard's live views are fed by a broadcast bus: every mutating
//! endpoint publishes a fresh counts snapshot (and audit listing) after a
//! successful operation, and the SSE endpoints relay whatever arrives.
//! Dropped messages only cost a missed intermediate state; the next publish
//! carries the full picture again.

use rocket::tokio::sync::broadcast;

use crate::model::audit::AuditEntry;
use crate::tally::CountsSnapshot;

const CHANNEL_CAPACITY: usize = 16;

pub struct UpdateBus {
    counts: broadcast::Sender<CountsSnapshot>,
    audit: broadcast::Sender<Vec<AuditEntry>>,
}

impl UpdateBus {
    pub fn new() -> Self {
        let (counts, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (audit, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { counts, audit }
    }

    /// Push a full tally snapshot to every live counts stream.
    pub fn publish_counts(&self, snapshot: CountsSnapshot) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.counts.send(snapshot);
    }

    pub fn subscribe_counts(&self) -> broadcast::Receiver<CountsSnapshot> {
        self.counts.subscribe()
    }

    /// Push the newest-first audit trail to every live audit stream.
    pub fn publish_audit(&self, entries: Vec<AuditEntry>) {
        let _ = self.audit.send(entries);
    }

    pub fn subscribe_audit(&self) -> broadcast::Receiver<Vec<AuditEntry>> {
        self.audit.subscribe()
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}
