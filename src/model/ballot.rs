use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{position::Position, vote_record::VoteEntry};

/// One candidate picked for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateChoice {
    pub candidate_id: String,
    pub candidate_name: String,
}

/// A complete ballot as submitted by the UI: position name to choice.
pub type BallotSelections = HashMap<String, CandidateChoice>;

/// Check a ballot against the current position registry.
///
/// A valid ballot has exactly one non-empty selection for every known
/// position. Returns the selections as vote entries in ballot order.
pub fn validate_selections(
    positions: &[Position],
    selections: &BallotSelections,
) -> Result<Vec<VoteEntry>> {
    let required = positions.len();
    let mut votes = Vec::with_capacity(required);
    for position in positions {
        match selections.get(&position.name) {
            Some(choice) if !choice.candidate_id.is_empty() => votes.push(VoteEntry {
                position: position.name.clone(),
                candidate_id: choice.candidate_id.clone(),
                candidate_name: choice.candidate_name.clone(),
            }),
            _ => {}
        }
    }
    // Selections for unknown positions also fail the length check.
    if votes.len() != required || selections.len() != required {
        return Err(Error::IncompleteBallot {
            required,
            provided: votes.len(),
        });
    }
    Ok(votes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<Position> {
        vec![
            Position::example("President", 1),
            Position::example("Secretary", 2),
        ]
    }

    fn choice(id: &str, name: &str) -> CandidateChoice {
        CandidateChoice {
            candidate_id: id.to_string(),
            candidate_name: name.to_string(),
        }
    }

    #[test]
    fn complete_ballot_in_position_order() {
        let mut selections = BallotSelections::new();
        selections.insert("Secretary".to_string(), choice("s2", "Sam"));
        selections.insert("President".to_string(), choice("c1", "Pat"));

        let votes = validate_selections(&positions(), &selections).unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].position, "President");
        assert_eq!(votes[1].position, "Secretary");
    }

    #[test]
    fn missing_position_is_incomplete() {
        let mut selections = BallotSelections::new();
        selections.insert("President".to_string(), choice("c1", "Pat"));

        let err = validate_selections(&positions(), &selections).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteBallot {
                required: 2,
                provided: 1
            }
        ));
    }

    #[test]
    fn empty_candidate_id_is_incomplete() {
        let mut selections = BallotSelections::new();
        selections.insert("President".to_string(), choice("", "Pat"));
        selections.insert("Secretary".to_string(), choice("s2", "Sam"));

        let err = validate_selections(&positions(), &selections).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteBallot {
                required: 2,
                provided: 1
            }
        ));
    }

    #[test]
    fn unknown_position_is_rejected() {
        let mut selections = BallotSelections::new();
        selections.insert("President".to_string(), choice("c1", "Pat"));
        selections.insert("Secretary".to_string(), choice("s2", "Sam"));
        selections.insert("Treasurer".to_string(), choice("t9", "Tia"));

        assert!(validate_selections(&positions(), &selections).is_err());
    }
}
