//! Demographics persistence (one row per participant).

use crate::model::demographics::{DemographicsAnswers, DemographicsRecord};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::timestamp::format_timestamp;
use crate::repo::participant_repo::upsert_participant;
use crate::repo::{bool_to_int, int_to_bool, required_timestamp, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, TransactionBehavior};

const DEMOGRAPHICS_SELECT_SQL: &str = "SELECT
    id,
    asurite,
    gender,
    age,
    race_ethnicity,
    race_ethnicity_specify,
    major,
    major_category,
    major_category_specify,
    language_background,
    native_language,
    years_studied_english,
    years_in_us,
    program_use_only,
    created_at,
    updated_at
FROM demographics";

/// Repository interface for demographics answers.
pub trait DemographicsRepository {
    /// Upserts the participant and replaces their demographics in one
    /// transaction. Returns the participant as stored after the write.
    fn save_demographics(
        &mut self,
        answers: &DemographicsAnswers,
        now: DateTime<Utc>,
    ) -> RepoResult<(Participant, DemographicsRecord)>;
    fn get_demographics(
        &self,
        participant_id: &ParticipantId,
    ) -> RepoResult<Option<DemographicsRecord>>;
}

/// SQLite-backed demographics repository.
pub struct SqliteDemographicsRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteDemographicsRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl DemographicsRepository for SqliteDemographicsRepository<'_> {
    fn save_demographics(
        &mut self,
        answers: &DemographicsAnswers,
        now: DateTime<Utc>,
    ) -> RepoResult<(Participant, DemographicsRecord)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let participant =
            upsert_participant(&tx, &answers.participant_id, answers.program_use_only, now)?;
        let now_text = format_timestamp(now);

        tx.execute(
            "INSERT INTO demographics (
                asurite,
                gender,
                age,
                race_ethnicity,
                race_ethnicity_specify,
                major,
                major_category,
                major_category_specify,
                language_background,
                native_language,
                years_studied_english,
                years_in_us,
                program_use_only,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            ON CONFLICT (asurite) DO UPDATE
            SET
                gender = excluded.gender,
                age = excluded.age,
                race_ethnicity = excluded.race_ethnicity,
                race_ethnicity_specify = excluded.race_ethnicity_specify,
                major = excluded.major,
                major_category = excluded.major_category,
                major_category_specify = excluded.major_category_specify,
                language_background = excluded.language_background,
                native_language = excluded.native_language,
                years_studied_english = excluded.years_studied_english,
                years_in_us = excluded.years_in_us,
                program_use_only = excluded.program_use_only,
                updated_at = excluded.updated_at;",
            params![
                answers.participant_id.as_str(),
                answers.gender.as_str(),
                answers.age.as_str(),
                answers.race_ethnicity.as_str(),
                answers.race_ethnicity_specify.as_str(),
                answers.major.as_str(),
                answers.major_category.as_str(),
                answers.major_category_specify.as_str(),
                answers.language_background.as_str(),
                answers.native_language.as_str(),
                answers.years_studied_english.as_str(),
                answers.years_in_us.as_str(),
                bool_to_int(participant.program_use_only),
                now_text.as_str(),
            ],
        )?;

        let record = load_demographics(&tx, &answers.participant_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "demographics row missing after upsert for `{}`",
                answers.participant_id
            ))
        })?;
        tx.commit()?;

        Ok((participant, record))
    }

    fn get_demographics(
        &self,
        participant_id: &ParticipantId,
    ) -> RepoResult<Option<DemographicsRecord>> {
        load_demographics(self.conn, participant_id)
    }
}

fn load_demographics(
    conn: &Connection,
    participant_id: &ParticipantId,
) -> RepoResult<Option<DemographicsRecord>> {
    let mut stmt = conn.prepare(&format!("{DEMOGRAPHICS_SELECT_SQL} WHERE asurite = ?1;"))?;
    let mut rows = stmt.query([participant_id.as_str()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_demographics_row(row)?));
    }
    Ok(None)
}

fn parse_demographics_row(row: &Row<'_>) -> RepoResult<DemographicsRecord> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(DemographicsRecord {
        id: row.get("id")?,
        participant_id: ParticipantId::from_stored(row.get("asurite")?),
        gender: row.get("gender")?,
        age: row.get("age")?,
        race_ethnicity: row.get("race_ethnicity")?,
        race_ethnicity_specify: row.get("race_ethnicity_specify")?,
        major: row.get("major")?,
        major_category: row.get("major_category")?,
        major_category_specify: row.get("major_category_specify")?,
        language_background: row.get("language_background")?,
        native_language: row.get("native_language")?,
        years_studied_english: row.get("years_studied_english")?,
        years_in_us: row.get("years_in_us")?,
        program_use_only: int_to_bool(
            row.get("program_use_only")?,
            "demographics.program_use_only",
        )?,
        created_at: required_timestamp(&created_at, "demographics.created_at")?,
        updated_at: required_timestamp(&updated_at, "demographics.updated_at")?,
    })
}
