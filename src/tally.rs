//! Read-side aggregation over the vote counters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::vote_count::VoteCount;
use crate::store::VoteStore;

/// Full tally map: position name to candidate ID to count.
pub type CountsSnapshot = BTreeMap<String, BTreeMap<String, u64>>;

/// Build the dashboard's `position -> candidate -> count` map.
pub async fn counts_snapshot(store: &dyn VoteStore) -> Result<CountsSnapshot> {
    let counts = store.list_counts().await?;
    let mut snapshot = CountsSnapshot::new();
    for count in counts {
        snapshot
            .entry(count.position)
            .or_default()
            .insert(count.candidate_id, count.count);
    }
    Ok(snapshot)
}

/// The leading candidate for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub candidate_id: String,
    pub candidate_name: String,
    pub count: u64,
}

/// Pick the leading candidate per position.
///
/// A candidate only replaces the current leader with a strictly greater
/// count, so a tie resolves to whichever candidate appears first in the
/// results list. Positions where every count is zero have no winner.
pub fn winners(counts: &[VoteCount]) -> BTreeMap<String, Winner> {
    let mut leaders: BTreeMap<String, Winner> = BTreeMap::new();
    for count in counts {
        if count.count == 0 {
            continue;
        }
        let leads = leaders
            .get(&count.position)
            .map_or(true, |leader| count.count > leader.count);
        if leads {
            leaders.insert(
                count.position.clone(),
                Winner {
                    candidate_id: count.candidate_id.clone(),
                    candidate_name: count.candidate_name.clone(),
                    count: count.count,
                },
            );
        }
    }
    leaders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(position: &str, candidate_id: &str, count: u64) -> VoteCount {
        VoteCount {
            position: position.to_string(),
            candidate_id: candidate_id.to_string(),
            candidate_name: format!("Candidate {candidate_id}"),
            count,
        }
    }

    #[test]
    fn ties_resolve_to_first_listed_candidate() {
        let counts = vec![
            count("President", "c1", 7),
            count("President", "c2", 7),
            count("President", "c3", 2),
        ];
        let winners = winners(&counts);
        assert_eq!(winners["President"].candidate_id, "c1");
        assert_eq!(winners["President"].count, 7);
    }

    #[test]
    fn zero_counts_never_win() {
        let counts = vec![count("Secretary", "s1", 0), count("Secretary", "s2", 0)];
        assert!(winners(&counts).is_empty());
    }

    #[test]
    fn winners_are_per_position() {
        let counts = vec![
            count("President", "c1", 1),
            count("President", "c2", 4),
            count("Secretary", "s1", 3),
        ];
        let winners = winners(&counts);
        assert_eq!(winners.len(), 2);
        assert_eq!(winners["President"].candidate_id, "c2");
        assert_eq!(winners["Secretary"].candidate_id, "s1");
    }

    #[rocket::async_test]
    async fn snapshot_groups_by_position() {
        let store = crate::store::MemoryVoteStore::default();
        store.increment_count("President", "c1", "Pat").await.unwrap();
        store.increment_count("President", "c1", "Pat").await.unwrap();
        store.increment_count("Secretary", "s1", "Sam").await.unwrap();

        let snapshot = counts_snapshot(&store).await.unwrap();
        assert_eq!(snapshot["President"]["c1"], 2);
        assert_eq!(snapshot["Secretary"]["s1"], 1);
    }
}
