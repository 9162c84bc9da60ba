//! Leaderboard: ranked score entries, request handling and client
//!
//! Entries are ordered by score (highest first), ties going to the earlier
//! submission. The same request handler backs the native in-process
//! transport and mirrors what the web host talks to over HTTP.

pub mod api;
pub mod client;
pub mod entry;
pub mod store;

pub use api::{ApiResponse, RankingsApi, Submission, normalize_name};
pub use client::{
    ClientError, InProcessTransport, LeaderboardClient, LeaderboardView, RequestKind, Ticket,
    response_from_text, server_missing,
};
pub use entry::RankingEntry;
pub use store::{LocalRankingStore, MemoryStore, RankingStore, seed_demo_rows};

use thiserror::Error;

use crate::persistence::PersistError;

/// Stored names are cut to this many characters
pub const MAX_NAME_CHARS: usize = 50;
/// Raw names longer than this are rejected outright
pub const NAME_PAYLOAD_LIMIT: usize = 256;
/// Name input field length on the ranking screen
pub const NAME_INPUT_CHARS: usize = 20;
/// Entries returned by a read
pub const READ_LIMIT: usize = 50;
/// Entries shown on the ranking screen
pub const DISPLAY_LIMIT: usize = 10;

/// Why a submission was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Name and score are required")]
    MissingFields,
    #[error("Score must be a whole number")]
    FractionalScore,
    #[error("Score must be greater than 0")]
    NonPositiveScore,
    #[error("Score out of range")]
    ScoreOutOfRange,
    #[error("Name too long")]
    NameTooLong,
    #[error("Invalid request body")]
    InvalidBody,
}

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence failed: {0}")]
    Persist(#[from] PersistError),
    #[error("store unavailable")]
    Unavailable,
}

/// 1-based rank `score` would take: before the first entry it strictly beats
pub fn potential_rank(entries: &[RankingEntry], score: u32) -> usize {
    entries
        .iter()
        .position(|e| score > e.score)
        .unwrap_or(entries.len())
        + 1
}

/// Strictly beats the current best (an empty board has no record to beat)
pub fn is_new_record(entries: &[RankingEntry], score: u32) -> bool {
    entries.first().is_some_and(|top| score > top.score)
}

/// Only positive scores may be submitted
pub fn can_submit(score: u32) -> bool {
    score > 0
}
