use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mongodb::bson::oid::ObjectId;

use crate::error::Result;
use crate::model::{
    audit::{AuditEntry, NewAuditEntry},
    position::Position,
    vote_count::{count_key, VoteCount},
    vote_record::VoteRecord,
};

use super::{InsertOutcome, VoteStore};

/// An in-process [`VoteStore`].
///
/// Backs the test suite and is handy for running the server without a
/// database. Counts are listed in key order, which fixes the "results list"
/// order that winner tie-breaking is defined against.
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    positions: Vec<Position>,
    records: BTreeMap<String, VoteRecord>,
    counts: BTreeMap<String, VoteCount>,
    audit: Vec<AuditEntry>,
}

impl MemoryVoteStore {
    pub fn with_positions(mut positions: Vec<Position>) -> Self {
        positions.sort_by_key(|position| position.order);
        Self {
            state: RwLock::new(State {
                positions,
                ..State::default()
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[rocket::async_trait]
impl VoteStore for MemoryVoteStore {
    async fn list_positions(&self) -> Result<Vec<Position>> {
        Ok(self.read().positions.clone())
    }

    async fn vote_record(&self, user_id: &str) -> Result<Option<VoteRecord>> {
        Ok(self.read().records.get(user_id).cloned())
    }

    async fn insert_vote_record(&self, record: &VoteRecord) -> Result<InsertOutcome> {
        let mut state = self.write();
        if state.records.contains_key(&record.user_id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state
            .records
            .insert(record.user_id.clone(), record.clone());
        Ok(InsertOutcome::Created)
    }

    async fn delete_vote_record(&self, user_id: &str) -> Result<bool> {
        Ok(self.write().records.remove(user_id).is_some())
    }

    async fn list_vote_records(&self) -> Result<Vec<VoteRecord>> {
        let mut records: Vec<VoteRecord> = self.read().records.values().cloned().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn delete_all_vote_records(&self) -> Result<u64> {
        let mut state = self.write();
        let deleted = state.records.len() as u64;
        state.records.clear();
        Ok(deleted)
    }

    async fn total_vote_records(&self) -> Result<u64> {
        Ok(self.read().records.len() as u64)
    }

    async fn increment_count(
        &self,
        position: &str,
        candidate_id: &str,
        candidate_name: &str,
    ) -> Result<()> {
        let mut state = self.write();
        state
            .counts
            .entry(count_key(position, candidate_id))
            .and_modify(|count| count.count += 1)
            .or_insert_with(|| VoteCount {
                position: position.to_string(),
                candidate_id: candidate_id.to_string(),
                candidate_name: candidate_name.to_string(),
                count: 1,
            });
        Ok(())
    }

    async fn decrement_count(&self, position: &str, candidate_id: &str) -> Result<()> {
        let mut state = self.write();
        if let Some(count) = state.counts.get_mut(&count_key(position, candidate_id)) {
            count.count = count.count.saturating_sub(1);
        }
        Ok(())
    }

    async fn list_counts(&self) -> Result<Vec<VoteCount>> {
        Ok(self.read().counts.values().cloned().collect())
    }

    async fn zero_all_counts(&self) -> Result<u64> {
        let mut state = self.write();
        for count in state.counts.values_mut() {
            count.count = 0;
        }
        Ok(state.counts.len() as u64)
    }

    async fn append_audit_entry(&self, entry: &NewAuditEntry) -> Result<()> {
        self.write().audit.push(AuditEntry {
            id: ObjectId::new().to_hex(),
            entry: entry.clone(),
        });
        Ok(())
    }

    async fn list_audit_entries(&self) -> Result<Vec<AuditEntry>> {
        let mut entries = self.read().audit.clone();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
