use serde::{Deserialize, Serialize};

/// A contested role with its own slate of candidates.
///
/// Positions are managed by the external registry; this backend only reads
/// them to determine the ballot sequence and completeness count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Defines the ballot sequence; positions are listed in ascending order.
    pub order: u32,
}
