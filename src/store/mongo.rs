use std::ops::Deref;

use mongodb::{
    bson::{doc, oid::ObjectId},
    error::{Error as DbError, ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, UpdateOptions},
    Collection, Database, IndexModel,
};
use rocket::futures::TryStreamExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    audit::{AuditEntry, AuditEntryCore, NewAuditEntry},
    position::Position,
    vote_count::{count_key, VoteCount},
    vote_record::VoteRecord,
};

use super::{InsertOutcome, VoteStore};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A document stored under an explicit string key.
///
/// Vote records are keyed by the voter's identity ID and vote counts by
/// `"{position}_{candidateId}"`, so uniqueness falls out of the `_id` index
/// and "insert if absent" is a single conditional write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyed<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub inner: T,
}

impl<T> Keyed<T> {
    fn new(id: String, inner: T) -> Self {
        Self { id, inner }
    }
}

impl MongoCollection for Position {
    const NAME: &'static str = "positions";
}

impl MongoCollection for Keyed<VoteRecord> {
    const NAME: &'static str = "voteRecords";
}

impl MongoCollection for Keyed<VoteCount> {
    const NAME: &'static str = "voteCounts";
}

impl MongoCollection for Keyed<AuditEntryCore> {
    const NAME: &'static str = "auditLogs";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> std::result::Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Position collection: ballot ordering.
    let position_index = IndexModel::builder().keys(doc! {"order": 1}).build();
    Coll::<Position>::from_db(db)
        .create_index(position_index, None)
        .await?;

    // Vote count collection: dashboard grouping.
    let totals_index = IndexModel::builder()
        .keys(doc! {"position": 1, "candidateId": 1})
        .options(IndexOptions::builder().unique(true).build())
        .build();
    Coll::<Keyed<VoteCount>>::from_db(db)
        .create_index(totals_index, None)
        .await?;

    // Audit log collection: newest-first listing.
    let audit_index = IndexModel::builder().keys(doc! {"timestamp": -1}).build();
    Coll::<Keyed<AuditEntryCore>>::from_db(db)
        .create_index(audit_index, None)
        .await?;

    Ok(())
}

/// The production [`VoteStore`], backed by MongoDB.
pub struct MongoVoteStore {
    positions: Coll<Position>,
    records: Coll<Keyed<VoteRecord>>,
    counts: Coll<Keyed<VoteCount>>,
    audit: Coll<Keyed<AuditEntryCore>>,
}

impl MongoVoteStore {
    pub fn from_db(db: &Database) -> Self {
        Self {
            positions: Coll::from_db(db),
            records: Coll::from_db(db),
            counts: Coll::from_db(db),
            audit: Coll::from_db(db),
        }
    }
}

/// Was this write rejected because the `_id` already exists?
fn is_duplicate_key(err: &DbError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_err)) if write_err.code == 11000
    )
}

/// Collect a cursor of keyed documents, discarding the redundant keys.
async fn collect_inner<T>(coll: &Coll<Keyed<T>>) -> Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
    Keyed<T>: MongoCollection,
{
    let keyed: Vec<Keyed<T>> = coll.find(None, None).await?.try_collect().await?;
    Ok(keyed.into_iter().map(|doc| doc.inner).collect())
}

#[rocket::async_trait]
impl VoteStore for MongoVoteStore {
    async fn list_positions(&self) -> Result<Vec<Position>> {
        let options = FindOptions::builder().sort(doc! {"order": 1}).build();
        Ok(self.positions.find(None, options).await?.try_collect().await?)
    }

    async fn vote_record(&self, user_id: &str) -> Result<Option<VoteRecord>> {
        let found = self.records.find_one(doc! {"_id": user_id}, None).await?;
        Ok(found.map(|doc| doc.inner))
    }

    async fn insert_vote_record(&self, record: &VoteRecord) -> Result<InsertOutcome> {
        let document = Keyed::new(record.user_id.clone(), record.clone());
        match self.records.insert_one(document, None).await {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_vote_record(&self, user_id: &str) -> Result<bool> {
        let result = self.records.delete_one(doc! {"_id": user_id}, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_vote_records(&self) -> Result<Vec<VoteRecord>> {
        // Timestamps are stored in the record's own serialisation, so order
        // here rather than in the query.
        let mut records = collect_inner(&self.records).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn delete_all_vote_records(&self) -> Result<u64> {
        let result = self.records.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }

    async fn total_vote_records(&self) -> Result<u64> {
        Ok(self.records.count_documents(None, None).await?)
    }

    async fn increment_count(
        &self,
        position: &str,
        candidate_id: &str,
        candidate_name: &str,
    ) -> Result<()> {
        let filter = doc! {"_id": count_key(position, candidate_id)};
        let update = doc! {
            "$inc": {"count": 1},
            "$setOnInsert": {
                "position": position,
                "candidateId": candidate_id,
                "candidateName": candidate_name,
            },
        };
        let options = UpdateOptions::builder().upsert(true).build();
        self.counts.update_one(filter, update, options).await?;
        Ok(())
    }

    async fn decrement_count(&self, position: &str, candidate_id: &str) -> Result<()> {
        // The count filter floors the counter at zero.
        let filter = doc! {
            "_id": count_key(position, candidate_id),
            "count": {"$gt": 0},
        };
        let update = doc! {"$inc": {"count": -1}};
        self.counts.update_one(filter, update, None).await?;
        Ok(())
    }

    async fn list_counts(&self) -> Result<Vec<VoteCount>> {
        collect_inner(&self.counts).await
    }

    async fn zero_all_counts(&self) -> Result<u64> {
        let result = self
            .counts
            .update_many(doc! {}, doc! {"$set": {"count": 0}}, None)
            .await?;
        Ok(result.matched_count)
    }

    async fn append_audit_entry(&self, entry: &NewAuditEntry) -> Result<()> {
        let document = Keyed::new(ObjectId::new().to_hex(), entry.clone());
        self.audit.insert_one(document, None).await?;
        Ok(())
    }

    async fn list_audit_entries(&self) -> Result<Vec<AuditEntry>> {
        let keyed: Vec<Keyed<AuditEntryCore>> =
            self.audit.find(None, None).await?.try_collect().await?;
        let mut entries: Vec<AuditEntry> = keyed
            .into_iter()
            .map(|doc| AuditEntry {
                id: doc.id,
                entry: doc.inner,
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
