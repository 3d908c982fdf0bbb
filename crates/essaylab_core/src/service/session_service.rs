//! Writing session lifecycle and essay submission pipeline.
//!
//! # Responsibility
//! - Start sessions for (possibly new) participants.
//! - Run the one-time submission: validate, bound, derive, commit, back up.
//!
//! # Invariants
//! - Exactly one submission per session succeeds; the storage-level
//!   compare-and-set decides races between concurrent callers.
//! - Length is checked before anything is persisted or backed up.
//! - Backup happens after the commit and can never turn a committed
//!   submission into an error.

use crate::backup::{BackupOutcome, EssayBackup};
use crate::clock::Clock;
use crate::model::essay::{
    char_count, duration_seconds, normalize_essay_text, word_count, MAX_ESSAY_CHARS,
};
use crate::model::participant::ParticipantId;
use crate::model::session::{EssaySubmission, SessionId, WritingSession};
use crate::model::timestamp::to_storage_precision;
use crate::repo::session_repo::SessionRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Service error for session use cases.
#[derive(Debug)]
pub enum SessionServiceError {
    /// Unknown (or unparseable) session id, as supplied by the caller.
    NotFound(String),
    AlreadySubmitted(SessionId),
    /// Essay exceeds [`MAX_ESSAY_CHARS`] after trimming.
    TooLong { chars: usize, max: usize },
    Repo(RepoError),
}

impl Display for SessionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(_) => write!(f, "Invalid session_id"),
            Self::AlreadySubmitted(_) => write!(f, "Essay already submitted for this session."),
            Self::TooLong { max, .. } => write!(f, "Essay exceeds {max} characters."),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SessionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SessionNotFound(id) => Self::NotFound(id.to_string()),
            RepoError::AlreadySubmitted(id) => Self::AlreadySubmitted(id),
            other => Self::Repo(other),
        }
    }
}

/// Result of `start_session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub started_at: DateTime<Utc>,
}

/// Result of a successful `submit_essay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedEssay {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub submitted_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub word_count: u32,
    pub char_count: u32,
    /// Diagnostics only; never affects success.
    pub backup: BackupOutcome,
}

/// Session service over a repository, a clock and a backup handle.
pub struct SessionService<R: SessionRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    backup: EssayBackup,
}

impl<R: SessionRepository> SessionService<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>, backup: EssayBackup) -> Self {
        Self {
            repo,
            clock,
            backup,
        }
    }

    /// Starts a session for `participant_id`, creating the participant when
    /// needed. Stored consent is left untouched.
    pub fn start_session(
        &mut self,
        participant_id: &ParticipantId,
    ) -> Result<StartedSession, SessionServiceError> {
        let now = to_storage_precision(self.clock.now());
        let session = self.repo.start_session(participant_id, now)?;
        let started_at = session
            .started_at
            .ok_or_else(|| RepoError::InvalidData("new session has no started_at".to_string()))?;

        info!(
            "event=session_start module=session status=ok session_id={} participant={}",
            session.id, session.participant_id
        );
        Ok(StartedSession {
            session_id: session.id,
            participant_id: session.participant_id,
            started_at,
        })
    }

    /// Submits the essay for `session_id`.
    ///
    /// # Errors
    /// - `NotFound` for unknown or malformed ids; nothing is written.
    /// - `AlreadySubmitted` when a submission already won, including a
    ///   concurrent one that committed between lookup and write.
    /// - `TooLong` when the trimmed text exceeds [`MAX_ESSAY_CHARS`].
    pub fn submit_essay(
        &self,
        session_id: &str,
        essay_text: Option<&str>,
    ) -> Result<SubmittedEssay, SessionServiceError> {
        let parsed_id = Uuid::parse_str(session_id.trim())
            .map_err(|_| SessionServiceError::NotFound(session_id.to_string()))?;
        let session = self
            .repo
            .get_session(parsed_id)?
            .ok_or_else(|| SessionServiceError::NotFound(session_id.to_string()))?;
        if session.is_submitted() {
            warn!(
                "event=essay_submit module=session status=rejected reason=already_submitted session_id={}",
                session.id
            );
            return Err(SessionServiceError::AlreadySubmitted(session.id));
        }

        let text = normalize_essay_text(essay_text);
        let chars = text.chars().count();
        if chars > MAX_ESSAY_CHARS {
            warn!(
                "event=essay_submit module=session status=rejected reason=too_long session_id={} chars={}",
                session.id, chars
            );
            return Err(SessionServiceError::TooLong {
                chars,
                max: MAX_ESSAY_CHARS,
            });
        }

        let now = to_storage_precision(self.clock.now());
        let submission = EssaySubmission {
            word_count: word_count(&text),
            char_count: char_count(&text),
            duration_seconds: duration_seconds(session.started_at, now),
            essay_text: text,
            submitted_at: now,
        };
        if let Err(err) = self.repo.mark_submitted(session.id, &submission) {
            warn!(
                "event=essay_submit module=session status=error session_id={} error={}",
                session.id, err
            );
            return Err(err.into());
        }

        info!(
            "event=essay_submit module=session status=ok session_id={} duration_seconds={} word_count={} char_count={}",
            session.id, submission.duration_seconds, submission.word_count, submission.char_count
        );

        let backup = self.backup.store(
            &session.participant_id,
            session.id,
            &submission.essay_text,
            submission.submitted_at,
        );

        Ok(SubmittedEssay {
            session_id: session.id,
            participant_id: session.participant_id,
            submitted_at: submission.submitted_at,
            duration_seconds: submission.duration_seconds,
            word_count: submission.word_count,
            char_count: submission.char_count,
            backup,
        })
    }

    pub fn get_session(&self, session_id: SessionId) -> RepoResult<Option<WritingSession>> {
        self.repo.get_session(session_id)
    }

    pub fn list_sessions_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> RepoResult<Vec<WritingSession>> {
        self.repo.list_sessions_for_participant(participant_id)
    }
}
