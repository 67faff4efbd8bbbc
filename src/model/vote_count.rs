use serde::{Deserialize, Serialize};

/// Running total for one (position, candidate) pair.
///
/// This is a derived aggregate maintained incrementally by the ledger, never
/// recomputed from scratch on read. Resetting an election zeroes the count
/// but keeps the document so candidate labels survive into the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCount {
    pub position: String,
    pub candidate_id: String,
    pub candidate_name: String,
    pub count: u64,
}

/// The document key for a (position, candidate) counter.
pub fn count_key(position: &str, candidate_id: &str) -> String {
    format!("{position}_{candidate_id}")
}
