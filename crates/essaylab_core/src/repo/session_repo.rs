//! Writing session persistence.
//!
//! # Responsibility
//! - Create sessions together with their participant row.
//! - Apply the one-time submission as a compare-and-set on `submitted_at`.
//!
//! # Invariants
//! - `mark_submitted` only touches rows whose `submitted_at IS NULL`; a lost
//!   race surfaces as `AlreadySubmitted`, never as an overwrite.
//! - Sessions are never deleted here.

use crate::model::participant::ParticipantId;
use crate::model::session::{EssaySubmission, SessionId, WritingSession};
use crate::model::timestamp::{format_timestamp, parse_timestamp};
use crate::repo::participant_repo::upsert_participant;
use crate::repo::{required_timestamp, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

const SESSION_SELECT_SQL: &str = "SELECT
    id,
    asurite,
    started_at,
    submitted_at,
    duration_seconds,
    essay_text,
    word_count,
    char_count
FROM writing_sessions";

/// Repository interface for writing sessions.
pub trait SessionRepository {
    /// Ensures the participant (consent untouched) and inserts a new session,
    /// both in one transaction.
    fn start_session(
        &mut self,
        participant_id: &ParticipantId,
        started_at: DateTime<Utc>,
    ) -> RepoResult<WritingSession>;
    fn get_session(&self, id: SessionId) -> RepoResult<Option<WritingSession>>;
    /// Lists a participant's sessions, oldest first.
    fn list_sessions_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> RepoResult<Vec<WritingSession>>;
    /// Records the submission if and only if the session is still unsubmitted.
    fn mark_submitted(&self, id: SessionId, submission: &EssaySubmission) -> RepoResult<()>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn start_session(
        &mut self,
        participant_id: &ParticipantId,
        started_at: DateTime<Utc>,
    ) -> RepoResult<WritingSession> {
        let session = WritingSession::start(participant_id.clone(), started_at);
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        upsert_participant(&tx, participant_id, None, started_at)?;
        tx.execute(
            "INSERT INTO writing_sessions (
                id,
                asurite,
                started_at,
                submitted_at,
                duration_seconds,
                essay_text,
                word_count,
                char_count
            ) VALUES (?1, ?2, ?3, NULL, NULL, '', 0, 0);",
            params![
                session.id.to_string(),
                participant_id.as_str(),
                format_timestamp(started_at),
            ],
        )?;

        tx.commit()?;
        Ok(session)
    }

    fn get_session(&self, id: SessionId) -> RepoResult<Option<WritingSession>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SESSION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_session_row(row)?));
        }

        Ok(None)
    }

    fn list_sessions_for_participant(
        &self,
        participant_id: &ParticipantId,
    ) -> RepoResult<Vec<WritingSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT_SQL}
             WHERE asurite = ?1
             ORDER BY started_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([participant_id.as_str()])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }

        Ok(sessions)
    }

    fn mark_submitted(&self, id: SessionId, submission: &EssaySubmission) -> RepoResult<()> {
        let id_text = id.to_string();
        let changed = self.conn.execute(
            "UPDATE writing_sessions
             SET
                submitted_at = ?2,
                duration_seconds = ?3,
                essay_text = ?4,
                word_count = ?5,
                char_count = ?6
             WHERE id = ?1
               AND submitted_at IS NULL;",
            params![
                id_text.as_str(),
                format_timestamp(submission.submitted_at),
                submission.duration_seconds,
                submission.essay_text.as_str(),
                submission.word_count,
                submission.char_count,
            ],
        )?;

        if changed == 0 {
            return if session_exists(self.conn, id_text.as_str())? {
                Err(RepoError::AlreadySubmitted(id))
            } else {
                Err(RepoError::SessionNotFound(id))
            };
        }

        Ok(())
    }
}

fn session_exists(conn: &Connection, id: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM writing_sessions WHERE id = ?1;",
            [id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<WritingSession> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid `{id_text}` in writing_sessions.id"))
    })?;

    // Legacy rows may carry a blank start; only garbage text is rejected.
    let started_at = match row.get::<_, Option<String>>("started_at")? {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(required_timestamp(&value, "writing_sessions.started_at")?),
        None => None,
    };
    let submitted_at = row
        .get::<_, Option<String>>("submitted_at")?
        .map(|value| {
            parse_timestamp(&value).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid timestamp `{value}` in writing_sessions.submitted_at"
                ))
            })
        })
        .transpose()?;

    Ok(WritingSession {
        id,
        participant_id: ParticipantId::from_stored(row.get("asurite")?),
        started_at,
        submitted_at,
        duration_seconds: row.get("duration_seconds")?,
        essay_text: row.get("essay_text")?,
        word_count: read_count(row, "word_count")?,
        char_count: read_count(row, "char_count")?,
    })
}

fn read_count(row: &Row<'_>, column: &str) -> RepoResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid count `{value}` in writing_sessions.{column}"
        ))
    })
}
