use crate::events::UpdateBus;
use crate::store::VoteStore;
use crate::tally;

/// Publish the current tally and audit trail to the live streams.
///
/// Called after every successful mutation. Failures here only degrade the
/// live views; the mutation has already succeeded, so they are logged and
/// swallowed.
pub async fn broadcast_state(store: &dyn VoteStore, bus: &UpdateBus) {
    match tally::counts_snapshot(store).await {
        Ok(snapshot) => bus.publish_counts(snapshot),
        Err(err) => warn!("Failed to publish counts snapshot: {err}"),
    }
    match store.list_audit_entries().await {
        Ok(entries) => bus.publish_audit(entries),
        Err(err) => warn!("Failed to publish audit trail: {err}"),
    }
}
