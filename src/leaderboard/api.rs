//! Request handling for the rankings endpoint
//!
//! Transport-agnostic: a request body goes in, a status code and JSON body
//! come out. Storage failures are logged and reported generically.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use super::store::RankingStore;
use super::{MAX_NAME_CHARS, NAME_PAYLOAD_LIMIT, READ_LIMIT, SubmitError};

/// Status code and JSON body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A validated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Trimmed and truncated
    pub name: String,
    pub score: u32,
}

impl Submission {
    /// Validate a decoded request body
    pub fn from_body(body: &Value) -> Result<Self, SubmitError> {
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or(SubmitError::MissingFields)?;
        let score = body
            .get("score")
            .filter(|s| s.is_number())
            .ok_or(SubmitError::MissingFields)?;

        let score = parse_score(score)?;
        if name.chars().count() > NAME_PAYLOAD_LIMIT {
            return Err(SubmitError::NameTooLong);
        }

        Ok(Self {
            name: normalize_name(name),
            score,
        })
    }
}

fn parse_score(value: &Value) -> Result<u32, SubmitError> {
    if let Some(n) = value.as_u64() {
        if n == 0 {
            return Err(SubmitError::NonPositiveScore);
        }
        return u32::try_from(n).map_err(|_| SubmitError::ScoreOutOfRange);
    }
    if value.as_i64().is_some() {
        // Negative integers
        return Err(SubmitError::NonPositiveScore);
    }
    let n = value.as_f64().ok_or(SubmitError::MissingFields)?;
    if n <= 0.0 {
        return Err(SubmitError::NonPositiveScore);
    }
    if n.fract() != 0.0 {
        return Err(SubmitError::FractionalScore);
    }
    if n > u32::MAX as f64 {
        return Err(SubmitError::ScoreOutOfRange);
    }
    Ok(n as u32)
}

/// Trim and keep the first `MAX_NAME_CHARS` characters
pub fn normalize_name(raw: &str) -> String {
    raw.trim().chars().take(MAX_NAME_CHARS).collect()
}

/// GET/POST handlers over a ranking store
pub struct RankingsApi<S: RankingStore> {
    store: S,
}

impl<S: RankingStore> RankingsApi<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Best entries, at most `READ_LIMIT`
    pub fn get(&self) -> ApiResponse {
        match self.store.top(READ_LIMIT) {
            Ok(entries) => ApiResponse::ok(json!(entries)),
            Err(e) => {
                log::warn!("Failed to fetch rankings: {}", e);
                ApiResponse::error(500, "Failed to fetch rankings")
            }
        }
    }

    /// Validate and store a submission
    pub fn post(&mut self, body: &str, now: DateTime<Utc>) -> ApiResponse {
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return ApiResponse::error(400, &SubmitError::InvalidBody.to_string());
        };
        let submission = match Submission::from_body(&value) {
            Ok(s) => s,
            Err(e) => {
                log::debug!("Rejected submission: {}", e);
                return ApiResponse::error(400, &e.to_string());
            }
        };

        match self.store.append(&submission.name, submission.score, now) {
            Ok(entry) => {
                log::info!("Ranking saved: {} ({})", entry.name, entry.score);
                ApiResponse::ok(json!(entry))
            }
            Err(e) => {
                log::warn!("Failed to save ranking: {}", e);
                ApiResponse::error(500, "Failed to save ranking")
            }
        }
    }
}
