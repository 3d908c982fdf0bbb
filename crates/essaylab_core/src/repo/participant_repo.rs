//! Participant registry persistence.
//!
//! # Invariants
//! - One row per normalized identifier; concurrent first writers collapse
//!   into a single row through the `ON CONFLICT` upsert.
//! - An omitted consent value never overwrites the stored one.

use crate::model::participant::{Participant, ParticipantId};
use crate::model::timestamp::format_timestamp;
use crate::repo::{bool_to_int, int_to_bool, required_timestamp, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for participant identities.
pub trait ParticipantRepository {
    /// Creates the participant or refreshes its consent flag.
    ///
    /// `now` is used as `created_at` only when the row is new.
    fn ensure_participant(
        &self,
        id: &ParticipantId,
        consent: Option<bool>,
        now: DateTime<Utc>,
    ) -> RepoResult<Participant>;
    fn get_participant(&self, id: &ParticipantId) -> RepoResult<Option<Participant>>;
}

/// SQLite-backed participant repository.
pub struct SqliteParticipantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParticipantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ParticipantRepository for SqliteParticipantRepository<'_> {
    fn ensure_participant(
        &self,
        id: &ParticipantId,
        consent: Option<bool>,
        now: DateTime<Utc>,
    ) -> RepoResult<Participant> {
        upsert_participant(self.conn, id, consent, now)
    }

    fn get_participant(&self, id: &ParticipantId) -> RepoResult<Option<Participant>> {
        let row = self
            .conn
            .query_row(
                "SELECT asurite, program_use_only, created_at
                 FROM participants
                 WHERE asurite = ?1;",
                [id.as_str()],
                read_participant_columns,
            )
            .optional()?;

        row.map(parse_participant_columns).transpose()
    }
}

/// Atomic insert-or-update used by every path that touches a participant.
///
/// Works on plain connections and open transactions alike.
pub(crate) fn upsert_participant(
    conn: &Connection,
    id: &ParticipantId,
    consent: Option<bool>,
    now: DateTime<Utc>,
) -> RepoResult<Participant> {
    let columns = conn.query_row(
        "INSERT INTO participants (asurite, program_use_only, created_at)
         VALUES (?1, COALESCE(?2, 0), ?3)
         ON CONFLICT (asurite) DO UPDATE
         SET program_use_only = COALESCE(?2, participants.program_use_only)
         RETURNING asurite, program_use_only, created_at;",
        params![id.as_str(), consent.map(bool_to_int), format_timestamp(now)],
        read_participant_columns,
    )?;

    parse_participant_columns(columns)
}

type ParticipantColumns = (String, i64, String);

fn read_participant_columns(row: &Row<'_>) -> rusqlite::Result<ParticipantColumns> {
    Ok((
        row.get("asurite")?,
        row.get("program_use_only")?,
        row.get("created_at")?,
    ))
}

fn parse_participant_columns(columns: ParticipantColumns) -> RepoResult<Participant> {
    let (asurite, program_use_only, created_at) = columns;
    Ok(Participant {
        id: ParticipantId::from_stored(asurite),
        program_use_only: int_to_bool(program_use_only, "participants.program_use_only")?,
        created_at: required_timestamp(&created_at, "participants.created_at")?,
    })
}
