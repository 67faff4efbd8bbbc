use std::fmt::Display;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The privileged mutations that get recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    DeleteVote,
    ResetAllVotes,
}

impl Display for AuditAction {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::DeleteVote => "delete_vote",
                Self::ResetAllVotes => "reset_all_votes",
            }
        )
    }
}

/// Core audit entry data, as produced by the vote-management operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryCore {
    pub action: AuditAction,
    /// User ID of the admin who performed the action.
    pub performed_by: String,
    pub performed_by_email: String,
    /// Set for individual vote deletions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_email: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub details: String,
    /// Total vote records before/after the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count_before: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count_after: Option<u64>,
}

/// An audit entry without an ID, ready for insertion.
pub type NewAuditEntry = AuditEntryCore;

/// An audit entry from the store, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    #[serde(flatten)]
    pub entry: AuditEntryCore,
}

impl Deref for AuditEntry {
    type Target = AuditEntryCore;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}
