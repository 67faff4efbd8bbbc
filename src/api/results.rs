use std::collections::BTreeMap;

use rocket::{
    response::stream::{Event, EventStream},
    serde::json::Json,
    tokio::sync::broadcast::error::RecvError,
    Route, State,
};

use crate::error::Result;
use crate::events::UpdateBus;
use crate::store::{SharedStore, VoteStore};
use crate::tally::{self, CountsSnapshot, Winner};

pub fn routes() -> Vec<Route> {
    routes![get_counts, counts_live, get_winners, get_turnout]
}

/// The full `position -> candidateId -> count` map.
#[get("/results/counts")]
async fn get_counts(store: &State<SharedStore>) -> Result<Json<CountsSnapshot>> {
    Ok(Json(tally::counts_snapshot(store.inner().as_ref()).await?))
}

/// Live tally updates: the current snapshot first, then the full map again
/// on every change.
#[get("/results/counts/live")]
fn counts_live(store: &State<SharedStore>, bus: &State<UpdateBus>) -> EventStream![Event] {
    let store = store.inner().clone();
    let mut updates = bus.subscribe_counts();
    EventStream! {
        match tally::counts_snapshot(store.as_ref()).await {
            Ok(snapshot) => yield Event::json(&snapshot),
            Err(err) => warn!("Failed to read initial counts snapshot: {err}"),
        }
        loop {
            match updates.recv().await {
                Ok(snapshot) => yield Event::json(&snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    // The next update carries the full state anyway.
                    warn!("Counts stream lagged, skipped {skipped} updates");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Per-position leader. Ties resolve to the candidate listed first in the
/// results; positions with no votes are absent.
#[get("/results/winners")]
async fn get_winners(store: &State<SharedStore>) -> Result<Json<BTreeMap<String, Winner>>> {
    let counts = store.list_counts().await?;
    Ok(Json(tally::winners(&counts)))
}

/// Total number of cast ballots.
#[get("/results/turnout")]
async fn get_turnout(store: &State<SharedStore>) -> Result<Json<u64>> {
    Ok(Json(store.total_vote_records().await?))
}
