//! The vote ledger: ballot acceptance and the admin compensating
//! transactions against it.
//!
//! The ledger owns the "has this identity voted" invariant. Acceptance is a
//! single conditional create on the vote record keyed by identity ID, so two
//! near-simultaneous submissions from the same identity cannot both land;
//! the rejected one surfaces as [`Error::AlreadyVoted`].
//!
//! There is no cross-document transaction: the record write happens before
//! the per-position tally increments, and a failure in between leaves the
//! record in place with some counters not yet bumped. That partial state is
//! valid and recoverable; an admin delete converges it.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::{
    audit::{AuditAction, NewAuditEntry},
    auth::Identity,
    ballot::{self, BallotSelections},
    vote_record::VoteRecord,
};
use crate::store::{InsertOutcome, VoteStore};

/// Has this identity already cast a ballot?
pub async fn has_voted(store: &dyn VoteStore, user_id: &str) -> Result<bool> {
    let record = store.vote_record(user_id).await?;
    Ok(record.map(|record| record.has_voted).unwrap_or(false))
}

/// Accept a complete ballot from an authenticated voter.
///
/// Exactly one vote record is created; on success one tally increment is
/// issued per position. Nothing is written when validation fails or the
/// voter has already voted.
pub async fn submit_ballot(
    store: &dyn VoteStore,
    voter: &Identity,
    selections: &BallotSelections,
) -> Result<VoteRecord> {
    let positions = store.list_positions().await?;
    if positions.is_empty() {
        return Err(Error::BadRequest(
            "No positions are currently defined".to_string(),
        ));
    }
    let votes = ballot::validate_selections(&positions, selections)?;

    let record = VoteRecord::new(voter, votes);
    match store.insert_vote_record(&record).await? {
        InsertOutcome::Created => {}
        InsertOutcome::AlreadyExists => return Err(Error::AlreadyVoted),
    }

    for vote in &record.votes {
        store
            .increment_count(&vote.position, &vote.candidate_id, &vote.candidate_name)
            .await?;
    }

    info!(
        "Recorded ballot for {} covering {} positions",
        voter.email,
        record.votes.len()
    );
    Ok(record)
}

/// Delete a single voter's ballot and roll its tallies back.
///
/// Returns the deleted record. One `delete_vote` audit entry is appended;
/// audit failure never fails the deletion.
pub async fn delete_vote(
    store: &dyn VoteStore,
    target_user_id: &str,
    admin: &Identity,
) -> Result<VoteRecord> {
    let before = store.total_vote_records().await?;
    let record = store
        .vote_record(target_user_id)
        .await?
        .ok_or_else(|| Error::VoteNotFound(target_user_id.to_string()))?;

    for vote in &record.votes {
        store
            .decrement_count(&vote.position, &vote.candidate_id)
            .await?;
    }
    store.delete_vote_record(target_user_id).await?;
    let after = store.total_vote_records().await?;

    let positions = record
        .votes
        .iter()
        .map(|vote| vote.position.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    append_best_effort(
        store,
        NewAuditEntry {
            action: AuditAction::DeleteVote,
            performed_by: admin.id.clone(),
            performed_by_email: admin.email.clone(),
            target_user_id: Some(record.user_id.clone()),
            target_user_email: Some(record.user_email.clone()),
            timestamp: Utc::now(),
            details: format!(
                "Deleted vote for user {}. Positions: {}",
                record.user_email, positions
            ),
            vote_count_before: Some(before),
            vote_count_after: Some(after),
        },
    )
    .await;

    info!("Deleted vote record of {}", record.user_email);
    Ok(record)
}

/// Summary of a completed reset, returned to the admin.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub records_deleted: u64,
    pub counts_reset: u64,
}

/// Wipe every vote record and zero every tally.
///
/// Count documents are kept (zeroed, not deleted) so candidate labels
/// survive into the next election cycle. Both steps are idempotent, so a
/// reset resumed after a partial failure converges to the same end state.
pub async fn reset_all_votes(store: &dyn VoteStore, admin: &Identity) -> Result<ResetOutcome> {
    let before = store.total_vote_records().await?;
    let records_deleted = store.delete_all_vote_records().await?;
    let counts_reset = store.zero_all_counts().await?;

    append_best_effort(
        store,
        NewAuditEntry {
            action: AuditAction::ResetAllVotes,
            performed_by: admin.id.clone(),
            performed_by_email: admin.email.clone(),
            target_user_id: None,
            target_user_email: None,
            timestamp: Utc::now(),
            details: format!("Reset all votes. Total votes deleted: {before}"),
            vote_count_before: Some(before),
            vote_count_after: Some(0),
        },
    )
    .await;

    warn!(
        "{} reset all votes ({} records deleted, {} counters zeroed)",
        admin.email, records_deleted, counts_reset
    );
    Ok(ResetOutcome {
        records_deleted,
        counts_reset,
    })
}

/// Audit logging is fire-and-forget: a failed append degrades observability
/// but must never fail the action it records.
async fn append_best_effort(store: &dyn VoteStore, entry: NewAuditEntry) {
    if let Err(err) = store.append_audit_entry(&entry).await {
        warn!("Failed to append {} audit entry: {err}", entry.action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::model::{ballot::CandidateChoice, position::Position};
    use crate::store::MemoryVoteStore;

    fn store() -> MemoryVoteStore {
        MemoryVoteStore::with_positions(vec![
            Position::example("President", 1),
            Position::example("Secretary", 2),
        ])
    }

    fn identity(n: u32) -> Identity {
        Identity {
            id: format!("user-{n}"),
            email: format!("user{n}@example.com"),
        }
    }

    fn admin() -> Identity {
        Identity {
            id: "admin-1".to_string(),
            email: "admin@example.com".to_string(),
        }
    }

    fn full_ballot(president: &str, secretary: &str) -> BallotSelections {
        let mut selections = BallotSelections::new();
        selections.insert(
            "President".to_string(),
            CandidateChoice {
                candidate_id: president.to_string(),
                candidate_name: format!("Candidate {president}"),
            },
        );
        selections.insert(
            "Secretary".to_string(),
            CandidateChoice {
                candidate_id: secretary.to_string(),
                candidate_name: format!("Candidate {secretary}"),
            },
        );
        selections
    }

    async fn counts_by_key(store: &MemoryVoteStore) -> BTreeMap<String, u64> {
        store
            .list_counts()
            .await
            .unwrap()
            .into_iter()
            .map(|count| {
                (
                    crate::model::vote_count::count_key(&count.position, &count.candidate_id),
                    count.count,
                )
            })
            .collect()
    }

    #[rocket::async_test]
    async fn second_submission_fails_and_writes_nothing() {
        let store = store();
        let voter = identity(1);

        submit_ballot(&store, &voter, &full_ballot("c1", "s1"))
            .await
            .unwrap();
        let counts_after_first = counts_by_key(&store).await;

        let err = submit_ballot(&store, &voter, &full_ballot("c2", "s2"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyVoted));

        assert_eq!(store.total_vote_records().await.unwrap(), 1);
        assert_eq!(counts_by_key(&store).await, counts_after_first);
        // The surviving record is the first one.
        let record = store.vote_record("user-1").await.unwrap().unwrap();
        assert_eq!(record.votes[0].candidate_id, "c1");
    }

    #[rocket::async_test]
    async fn incomplete_ballot_writes_nothing() {
        let store = store();
        let mut selections = BallotSelections::new();
        selections.insert(
            "President".to_string(),
            CandidateChoice {
                candidate_id: "c1".to_string(),
                candidate_name: "Candidate c1".to_string(),
            },
        );

        let err = submit_ballot(&store, &identity(1), &selections)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteBallot {
                required: 2,
                provided: 1
            }
        ));
        assert_eq!(store.total_vote_records().await.unwrap(), 0);
        assert!(store.list_counts().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn empty_registry_rejects_submission() {
        let store = MemoryVoteStore::default();
        let err = submit_ballot(&store, &identity(1), &BallotSelections::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[rocket::async_test]
    async fn tallies_add_up_across_voters() {
        let store = store();
        for n in 0..3 {
            submit_ballot(&store, &identity(n), &full_ballot("c1", "s1"))
                .await
                .unwrap();
        }
        for n in 3..5 {
            submit_ballot(&store, &identity(n), &full_ballot("c2", "s1"))
                .await
                .unwrap();
        }

        let counts = counts_by_key(&store).await;
        assert_eq!(counts["President_c1"], 3);
        assert_eq!(counts["President_c2"], 2);
        assert_eq!(counts["Secretary_s1"], 5);
        assert!(has_voted(&store, "user-0").await.unwrap());
        assert!(!has_voted(&store, "user-99").await.unwrap());
    }

    #[rocket::async_test]
    async fn delete_vote_reverses_one_ballot() {
        let store = store();
        submit_ballot(&store, &identity(1), &full_ballot("c1", "s2"))
            .await
            .unwrap();
        submit_ballot(&store, &identity(2), &full_ballot("c1", "s2"))
            .await
            .unwrap();

        let record = delete_vote(&store, "user-1", &admin()).await.unwrap();
        assert_eq!(record.user_email, "user1@example.com");

        assert!(store.vote_record("user-1").await.unwrap().is_none());
        assert_eq!(store.total_vote_records().await.unwrap(), 1);
        let counts = counts_by_key(&store).await;
        assert_eq!(counts["President_c1"], 1);
        assert_eq!(counts["Secretary_s2"], 1);

        let audit = store.list_audit_entries().await.unwrap();
        assert_eq!(audit.len(), 1);
        let entry = &audit[0];
        assert_eq!(entry.action, AuditAction::DeleteVote);
        assert_eq!(entry.performed_by, "admin-1");
        assert_eq!(entry.target_user_id.as_deref(), Some("user-1"));
        assert_eq!(entry.vote_count_before, Some(2));
        assert_eq!(entry.vote_count_after, Some(1));
        assert!(entry.details.contains("President"));
        assert!(entry.details.contains("Secretary"));
    }

    #[rocket::async_test]
    async fn delete_missing_vote_fails() {
        let store = store();
        let err = delete_vote(&store, "nobody", &admin()).await.unwrap_err();
        assert!(matches!(err, Error::VoteNotFound(_)));
        assert!(store.list_audit_entries().await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn reset_zeroes_counts_and_keeps_documents() {
        let store = store();
        for n in 0..4 {
            submit_ballot(&store, &identity(n), &full_ballot("c1", "s1"))
                .await
                .unwrap();
        }

        let outcome = reset_all_votes(&store, &admin()).await.unwrap();
        assert_eq!(outcome.records_deleted, 4);
        assert_eq!(outcome.counts_reset, 2);

        assert_eq!(store.total_vote_records().await.unwrap(), 0);
        let counts = store.list_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|count| count.count == 0));
        // Candidate labels survive for the next cycle.
        assert!(counts
            .iter()
            .any(|count| count.candidate_name == "Candidate c1"));

        let audit = store.list_audit_entries().await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::ResetAllVotes);
        assert_eq!(audit[0].vote_count_before, Some(4));
        assert_eq!(audit[0].vote_count_after, Some(0));

        // A repeated reset converges instead of erroring.
        let outcome = reset_all_votes(&store, &admin()).await.unwrap();
        assert_eq!(outcome.records_deleted, 0);
    }
}
