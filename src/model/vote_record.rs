use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::auth::Identity;

/// One selection within a ballot: a candidate for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntry {
    pub position: String,
    pub candidate_id: String,
    pub candidate_name: String,
}

/// The durable, identity-keyed proof that a ballot was cast.
///
/// Created at most once per voter and immutable afterwards; the only way out
/// of the ledger is a full admin deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub user_id: String,
    pub user_email: String,
    /// One entry per position known at submission time.
    pub votes: Vec<VoteEntry>,
    pub timestamp: DateTime<Utc>,
    pub has_voted: bool,
}

impl VoteRecord {
    pub fn new(voter: &Identity, votes: Vec<VoteEntry>) -> Self {
        Self {
            user_id: voter.id.clone(),
            user_email: voter.email.clone(),
            votes,
            timestamp: Utc::now(),
            has_voted: true,
        }
    }
}
