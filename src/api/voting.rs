use rocket::{serde::json::Json, Route, State};
use serde::Serialize;

use crate::error::Result;
use crate::events::UpdateBus;
use crate::ledger;
use crate::model::{
    auth::{AuthToken, Voter},
    ballot::BallotSelections,
    position::Position,
    vote_record::VoteRecord,
};
use crate::store::{SharedStore, VoteStore};

use super::common::broadcast_state;

pub fn routes() -> Vec<Route> {
    routes![get_positions, ballot_status, cast_ballot]
}

/// Read-only view of the position registry, in ballot order.
#[get("/positions")]
async fn get_positions(store: &State<SharedStore>) -> Result<Json<Vec<Position>>> {
    Ok(Json(store.list_positions().await?))
}

/// What the voting UI needs to gate itself: has this voter cast a ballot,
/// and if so what did it look like.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BallotStatus {
    has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<VoteRecord>,
}

#[get("/voter/ballot")]
async fn ballot_status(
    token: AuthToken<Voter>,
    store: &State<SharedStore>,
) -> Result<Json<BallotStatus>> {
    let record = store.vote_record(token.id()).await?;
    Ok(Json(BallotStatus {
        has_voted: record.as_ref().map(|r| r.has_voted).unwrap_or(false),
        record,
    }))
}

/// Cast a complete ballot. The authoritative duplicate check happens inside
/// the ledger, not here.
#[post("/voter/ballot", data = "<selections>", format = "json")]
async fn cast_ballot(
    token: AuthToken<Voter>,
    selections: Json<BallotSelections>,
    store: &State<SharedStore>,
    bus: &State<UpdateBus>,
) -> Result<Json<VoteRecord>> {
    let record = ledger::submit_ballot(store.inner().as_ref(), &token.identity(), &selections).await?;
    broadcast_state(store.inner().as_ref(), bus.inner()).await;
    Ok(Json(record))
}
