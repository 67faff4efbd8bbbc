use rocket::{
    response::stream::{Event, EventStream},
    serde::json::Json,
    tokio::sync::broadcast::error::RecvError,
    Route, State,
};

use crate::error::Result;
use crate::events::UpdateBus;
use crate::ledger::{self, ResetOutcome};
use crate::model::{
    audit::AuditEntry,
    auth::{Admin, AuthToken},
    vote_record::VoteRecord,
};
use crate::store::{SharedStore, VoteStore};

use super::common::broadcast_state;

pub fn routes() -> Vec<Route> {
    routes![
        get_vote_records,
        delete_vote,
        reset_all_votes,
        get_audit_logs,
        audit_logs_live,
    ]
}

/// Every cast ballot, newest first.
#[get("/admin/votes")]
async fn get_vote_records(
    _token: AuthToken<Admin>,
    store: &State<SharedStore>,
) -> Result<Json<Vec<VoteRecord>>> {
    Ok(Json(store.list_vote_records().await?))
}

/// Delete one voter's ballot and roll its tallies back.
#[delete("/admin/votes/<user_id>")]
async fn delete_vote(
    token: AuthToken<Admin>,
    user_id: &str,
    store: &State<SharedStore>,
    bus: &State<UpdateBus>,
) -> Result<Json<VoteRecord>> {
    let record = ledger::delete_vote(store.inner().as_ref(), user_id, &token.identity()).await?;
    broadcast_state(store.inner().as_ref(), bus.inner()).await;
    Ok(Json(record))
}

/// Wipe every ballot and zero the tallies for a fresh election cycle.
#[post("/admin/votes/reset")]
async fn reset_all_votes(
    token: AuthToken<Admin>,
    store: &State<SharedStore>,
    bus: &State<UpdateBus>,
) -> Result<Json<ResetOutcome>> {
    let outcome = ledger::reset_all_votes(store.inner().as_ref(), &token.identity()).await?;
    broadcast_state(store.inner().as_ref(), bus.inner()).await;
    Ok(Json(outcome))
}

/// The audit trail, newest first.
#[get("/admin/audit-logs")]
async fn get_audit_logs(
    _token: AuthToken<Admin>,
    store: &State<SharedStore>,
) -> Result<Json<Vec<AuditEntry>>> {
    Ok(Json(store.list_audit_entries().await?))
}

/// Live audit trail: the current listing first, then the full newest-first
/// list again after every admin mutation.
#[get("/admin/audit-logs/live")]
fn audit_logs_live(
    _token: AuthToken<Admin>,
    store: &State<SharedStore>,
    bus: &State<UpdateBus>,
) -> EventStream![Event] {
    let store = store.inner().clone();
    let mut updates = bus.subscribe_audit();
    EventStream! {
        match store.list_audit_entries().await {
            Ok(entries) => yield Event::json(&entries),
            Err(err) => warn!("Failed to read initial audit trail: {err}"),
        }
        loop {
            match updates.recv().await {
                Ok(entries) => yield Event::json(&entries),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Audit stream lagged, skipped {skipped} updates");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
