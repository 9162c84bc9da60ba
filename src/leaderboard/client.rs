//! Leaderboard client state
//!
//! Requests are asynchronous on the web, so every request hands out a
//! ticket. A result is applied only if its ticket is still current; results
//! that arrive after `detach` (or after a newer request of the same kind)
//! are dropped.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use thiserror::Error;

use super::api::{ApiResponse, RankingsApi};
use super::entry::RankingEntry;
use super::store::RankingStore;
use super::{READ_LIMIT, SubmitError, can_submit};

/// Failure reaching or understanding the leaderboard
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Fetch,
    Submit,
}

/// Handle for an in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
    kind: RequestKind,
}

impl Ticket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

/// What the ranking screen shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardView {
    pub entries: Vec<RankingEntry>,
    pub loading: bool,
    pub submitting: bool,
    /// Score already submitted this run
    pub submitted: bool,
    /// Non-fatal message for the player
    pub notice: Option<String>,
}

/// Tracks request tickets and the view they update
#[derive(Debug, Default)]
pub struct LeaderboardClient {
    epoch: u64,
    seq: u64,
    latest_fetch: Option<u64>,
    latest_submit: Option<u64>,
    view: LeaderboardView,
}

impl LeaderboardClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &LeaderboardView {
        &self.view
    }

    fn next_ticket(&mut self, kind: RequestKind) -> Ticket {
        self.seq += 1;
        Ticket {
            epoch: self.epoch,
            seq: self.seq,
            kind,
        }
    }

    fn is_current(&self, ticket: &Ticket, latest: Option<u64>) -> bool {
        ticket.epoch == self.epoch && latest == Some(ticket.seq)
    }

    /// Start loading the board
    pub fn begin_fetch(&mut self) -> Ticket {
        let ticket = self.next_ticket(RequestKind::Fetch);
        self.latest_fetch = Some(ticket.seq);
        self.view.loading = true;
        ticket
    }

    /// Apply a fetch result. Returns false when the result was stale.
    pub fn complete_fetch(&mut self, ticket: Ticket, result: Result<ApiResponse, ClientError>) -> bool {
        if ticket.kind != RequestKind::Fetch || !self.is_current(&ticket, self.latest_fetch) {
            log::debug!("Dropping stale leaderboard fetch");
            return false;
        }
        self.latest_fetch = None;
        self.view.loading = false;

        match result.and_then(decode_entries) {
            Ok(entries) => {
                self.view.entries = entries;
                self.view.notice = None;
            }
            Err(e) => {
                log::warn!("Leaderboard fetch failed: {}", e);
                self.view.notice = Some("Could not load rankings".to_string());
            }
        }
        true
    }

    /// Validate locally and build the request body for a submission
    pub fn begin_submit(&mut self, name: &str, score: u32) -> Result<(Ticket, String), SubmitError> {
        if name.trim().is_empty() {
            return Err(SubmitError::MissingFields);
        }
        if !can_submit(score) {
            return Err(SubmitError::NonPositiveScore);
        }
        let ticket = self.next_ticket(RequestKind::Submit);
        self.latest_submit = Some(ticket.seq);
        self.view.submitting = true;
        let body = json!({ "name": name.trim(), "score": score }).to_string();
        Ok((ticket, body))
    }

    /// Apply a submit result. Returns the stored entry on success.
    pub fn complete_submit(
        &mut self,
        ticket: Ticket,
        result: Result<ApiResponse, ClientError>,
    ) -> Option<RankingEntry> {
        if ticket.kind != RequestKind::Submit || !self.is_current(&ticket, self.latest_submit) {
            log::debug!("Dropping stale leaderboard submit");
            return None;
        }
        self.latest_submit = None;
        self.view.submitting = false;

        match result.and_then(decode_entry) {
            Ok(entry) => {
                self.view.submitted = true;
                self.view.notice = None;
                let pos = self
                    .view
                    .entries
                    .partition_point(|e| e.rank_cmp(&entry).is_lt());
                self.view.entries.insert(pos, entry.clone());
                self.view.entries.truncate(READ_LIMIT);
                Some(entry)
            }
            Err(e) => {
                log::warn!("Leaderboard submit failed: {}", e);
                self.view.notice = Some(match e {
                    ClientError::Rejected { message, .. } => message,
                    _ => "Could not save your score, try again".to_string(),
                });
                None
            }
        }
    }

    /// Invalidate every in-flight request (screen closed or run restarted)
    pub fn detach(&mut self) {
        self.epoch += 1;
        self.latest_fetch = None;
        self.latest_submit = None;
        self.view.loading = false;
        self.view.submitting = false;
    }

    /// Detach and clear per-run state for a new run
    pub fn reset_for_run(&mut self) {
        self.detach();
        self.view.submitted = false;
        self.view.notice = None;
    }
}

fn rejection(resp: &ApiResponse) -> ClientError {
    let message = resp
        .body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("Request failed")
        .to_string();
    ClientError::Rejected {
        status: resp.status,
        message,
    }
}

/// Decode a read response
pub fn decode_entries(resp: ApiResponse) -> Result<Vec<RankingEntry>, ClientError> {
    if !resp.is_success() {
        return Err(rejection(&resp));
    }
    Ok(serde_json::from_value(resp.body)?)
}

/// Decode a write response
pub fn decode_entry(resp: ApiResponse) -> Result<RankingEntry, ClientError> {
    if !resp.is_success() {
        return Err(rejection(&resp));
    }
    Ok(serde_json::from_value(resp.body)?)
}

/// Build a response from a raw HTTP status and body text
pub fn response_from_text(status: u16, text: &str) -> Result<ApiResponse, ClientError> {
    let body = serde_json::from_str(text)?;
    Ok(ApiResponse { status, body })
}

/// Whether a result shows there is no leaderboard server behind the endpoint
///
/// Unreachable hosts, 404/405 replies and non-JSON pages count as missing.
/// A JSON error from a real server does not.
pub fn server_missing(result: &Result<ApiResponse, ClientError>) -> bool {
    match result {
        Ok(resp) => matches!(resp.status, 404 | 405),
        Err(ClientError::Transport(_) | ClientError::Decode(_)) => true,
        Err(ClientError::Rejected { .. }) => false,
    }
}

/// Direct calls into a request handler, for hosts without a network
pub struct InProcessTransport<S: RankingStore> {
    api: RankingsApi<S>,
}

impl<S: RankingStore> InProcessTransport<S> {
    pub fn new(api: RankingsApi<S>) -> Self {
        Self { api }
    }

    pub fn fetch(&self) -> Result<ApiResponse, ClientError> {
        Ok(self.api.get())
    }

    pub fn submit(&mut self, body: &str, now: DateTime<Utc>) -> Result<ApiResponse, ClientError> {
        Ok(self.api.post(body, now))
    }
}
