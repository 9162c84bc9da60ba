//! Ranking entries and their total order

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// Auto-assigned identity
    pub id: u64,
    pub name: String,
    pub score: u32,
    /// Write time
    pub created_at: DateTime<Utc>,
}

impl RankingEntry {
    /// Leaderboard order: higher score first, then earlier creation, then lower id
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}
