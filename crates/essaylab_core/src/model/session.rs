//! Writing session record and lifecycle state.
//!
//! # Invariants
//! - `started_at` is written at creation and never changes.
//! - `submitted_at` moves from `None` to `Some` exactly once.
//! - Submission fields stay at their empty defaults until submission.

use crate::model::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Stable session identifier, generated at start.
pub type SessionId = Uuid;

/// Lifecycle state derived from `submitted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Started, essay not yet submitted. May stay here indefinitely.
    Created,
    /// Terminal; no transition leaves this state.
    Submitted,
}

/// Persisted writing session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritingSession {
    pub id: SessionId,
    /// Owning participant (`writing_sessions.asurite`).
    pub participant_id: ParticipantId,
    /// `None` only for legacy rows missing a start time.
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub essay_text: String,
    pub word_count: u32,
    pub char_count: u32,
}

impl WritingSession {
    /// Builds a freshly started session with a generated id.
    pub fn start(participant_id: ParticipantId, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_id,
            started_at: Some(started_at),
            submitted_at: None,
            duration_seconds: None,
            essay_text: String::new(),
            word_count: 0,
            char_count: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.submitted_at.is_some() {
            SessionState::Submitted
        } else {
            SessionState::Created
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state() == SessionState::Submitted
    }
}

/// Values written by the one-time `Created -> Submitted` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EssaySubmission {
    pub essay_text: String,
    pub word_count: u32,
    pub char_count: u32,
    pub duration_seconds: i64,
    pub submitted_at: DateTime<Utc>,
}
