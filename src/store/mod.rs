//! Storage substrate for the voting protocol.
//!
//! The ledger and tally code are written against [`VoteStore`], the narrow
//! slice of the document store the protocol actually needs: point reads and
//! conditional writes on the three vote collections plus a read of the
//! position registry. [`MongoVoteStore`] is the production implementation;
//! [`MemoryVoteStore`] backs the test suite and local development.

mod memory;
mod mongo;

pub use memory::MemoryVoteStore;
pub use mongo::{ensure_indexes_exist, Coll, MongoCollection, MongoVoteStore};

use std::sync::Arc;

use crate::error::Result;
use crate::model::{
    audit::{AuditEntry, NewAuditEntry},
    position::Position,
    vote_count::VoteCount,
    vote_record::VoteRecord,
};

/// Outcome of a conditional create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    /// A document with the same key already exists; nothing was written.
    AlreadyExists,
}

/// A store managed by rocket and shared between request handlers.
pub type SharedStore = Arc<dyn VoteStore>;

/// The document-store operations the voting protocol consumes.
///
/// Every method is an independent network round trip; no method is assumed
/// to be atomic with any other. The per-method guarantees (unique-key
/// insert, atomic increment, floored decrement) are the only atomicity the
/// protocol relies on.
#[rocket::async_trait]
pub trait VoteStore: Send + Sync {
    /// Current positions, in ballot order.
    async fn list_positions(&self) -> Result<Vec<Position>>;

    async fn vote_record(&self, user_id: &str) -> Result<Option<VoteRecord>>;

    /// Create the record only if no record exists for its user ID.
    async fn insert_vote_record(&self, record: &VoteRecord) -> Result<InsertOutcome>;

    /// Returns false if no record existed.
    async fn delete_vote_record(&self, user_id: &str) -> Result<bool>;

    /// All vote records, newest first.
    async fn list_vote_records(&self) -> Result<Vec<VoteRecord>>;

    /// Delete every vote record, returning how many were removed.
    async fn delete_all_vote_records(&self) -> Result<u64>;

    async fn total_vote_records(&self) -> Result<u64>;

    /// Atomically bump the counter for a (position, candidate) pair,
    /// creating it with count 1 when absent.
    async fn increment_count(
        &self,
        position: &str,
        candidate_id: &str,
        candidate_name: &str,
    ) -> Result<()>;

    /// Atomically lower the counter, never below zero. Missing counters are
    /// left missing.
    async fn decrement_count(&self, position: &str, candidate_id: &str) -> Result<()>;

    async fn list_counts(&self) -> Result<Vec<VoteCount>>;

    /// Set every counter to zero without deleting the documents. Returns the
    /// number of counters touched.
    async fn zero_all_counts(&self) -> Result<u64>;

    async fn append_audit_entry(&self, entry: &NewAuditEntry) -> Result<()>;

    /// All audit entries, newest first.
    async fn list_audit_entries(&self) -> Result<Vec<AuditEntry>>;
}
