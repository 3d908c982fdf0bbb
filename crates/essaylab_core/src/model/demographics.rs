//! Survey demographics captured once per participant.
//!
//! # Invariants
//! - At most one record per participant; saving again replaces the fields.
//! - Conditional "please specify" answers are required only when the
//!   matching choice was selected.

use crate::model::participant::ParticipantId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Race/ethnicity choice that requires a free-text answer.
pub const RACE_ETHNICITY_OTHER: &str = "Multiple ethnicity / Other (please specify)";
/// Major category choice that requires a free-text answer.
pub const MAJOR_CATEGORY_OTHER: &str = "Other (Please specify)";
/// Language background that requires the non-native follow-up answers.
pub const NON_NATIVE_LANGUAGE_BACKGROUND: &str =
    "I grew up speaking language(s) other than English";

/// Raw form answers as submitted by the caller.
///
/// Every field is optional so validation can report all gaps at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicsInput {
    pub asurite: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub race_ethnicity: Option<String>,
    pub race_ethnicity_specify: Option<String>,
    pub major: Option<String>,
    pub major_category: Option<String>,
    pub major_category_specify: Option<String>,
    pub language_background: Option<String>,
    pub native_language: Option<String>,
    pub years_studied_english: Option<String>,
    pub years_in_us: Option<String>,
    /// `None` keeps the participant's stored consent.
    pub program_use_only: Option<bool>,
}

/// Validated answers ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemographicsAnswers {
    pub participant_id: ParticipantId,
    pub gender: String,
    pub age: String,
    pub race_ethnicity: String,
    pub race_ethnicity_specify: String,
    pub major: String,
    pub major_category: String,
    pub major_category_specify: String,
    pub language_background: String,
    pub native_language: String,
    pub years_studied_english: String,
    pub years_in_us: String,
    pub program_use_only: Option<bool>,
}

/// Persisted demographics row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicsRecord {
    pub id: i64,
    pub participant_id: ParticipantId,
    pub gender: String,
    pub age: String,
    pub race_ethnicity: String,
    pub race_ethnicity_specify: String,
    pub major: String,
    pub major_category: String,
    pub major_category_specify: String,
    pub language_background: String,
    pub native_language: String,
    pub years_studied_english: String,
    pub years_in_us: String,
    pub program_use_only: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DemographicsInput {
    /// Checks required and conditional answers.
    ///
    /// Returns the normalized answers, or every validation message found.
    pub fn validate(&self) -> Result<DemographicsAnswers, Vec<String>> {
        let mut errors = Vec::new();

        let participant_id = self.asurite.as_deref().and_then(ParticipantId::normalize);
        if participant_id.is_none() {
            errors.push("Q1 (ASURite) is required.".to_string());
        }
        require(&self.gender, "Q2 (Gender) is required.", &mut errors);
        require(&self.age, "Q3 (Age) is required.", &mut errors);
        require(
            &self.race_ethnicity,
            "Q4 (Race/Ethnicity) is required.",
            &mut errors,
        );
        if answer(&self.race_ethnicity) == RACE_ETHNICITY_OTHER {
            require(
                &self.race_ethnicity_specify,
                "Please specify your ethnicity.",
                &mut errors,
            );
        }
        require(&self.major, "Q5 (Major) is required.", &mut errors);
        require(
            &self.major_category,
            "Q6 (Major Category) is required.",
            &mut errors,
        );
        if answer(&self.major_category) == MAJOR_CATEGORY_OTHER {
            require(
                &self.major_category_specify,
                "Please specify the category for Q6.",
                &mut errors,
            );
        }
        require(
            &self.language_background,
            "Q7 (Language Background) is required.",
            &mut errors,
        );
        if answer(&self.language_background) == NON_NATIVE_LANGUAGE_BACKGROUND {
            require(
                &self.native_language,
                "Q8 (Native Language) is required.",
                &mut errors,
            );
            require(
                &self.years_studied_english,
                "Q9 (Years Studied English) is required.",
                &mut errors,
            );
            require(
                &self.years_in_us,
                "Q10 (Years in US) is required.",
                &mut errors,
            );
        }

        match participant_id {
            Some(participant_id) if errors.is_empty() => Ok(DemographicsAnswers {
                participant_id,
                gender: answer(&self.gender).to_string(),
                age: answer(&self.age).to_string(),
                race_ethnicity: answer(&self.race_ethnicity).to_string(),
                race_ethnicity_specify: answer(&self.race_ethnicity_specify).to_string(),
                major: answer(&self.major).to_string(),
                major_category: answer(&self.major_category).to_string(),
                major_category_specify: answer(&self.major_category_specify).to_string(),
                language_background: answer(&self.language_background).to_string(),
                native_language: answer(&self.native_language).to_string(),
                years_studied_english: answer(&self.years_studied_english).to_string(),
                years_in_us: answer(&self.years_in_us).to_string(),
                program_use_only: self.program_use_only,
            }),
            _ => Err(errors),
        }
    }
}

fn answer(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn require(value: &Option<String>, message: &str, errors: &mut Vec<String>) {
    if answer(value).is_empty() {
        errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{DemographicsInput, NON_NATIVE_LANGUAGE_BACKGROUND, RACE_ETHNICITY_OTHER};

    fn complete_input() -> DemographicsInput {
        DemographicsInput {
            asurite: Some(" JDoe ".to_string()),
            gender: Some("Woman".to_string()),
            age: Some("18-24".to_string()),
            race_ethnicity: Some("Hispanic_Origin=No; Race=Asian".to_string()),
            major: Some("Biology".to_string()),
            major_category: Some("STEM".to_string()),
            language_background: Some("English only".to_string()),
            ..DemographicsInput::default()
        }
    }

    #[test]
    fn complete_input_validates_and_normalizes_id() {
        let answers = complete_input().validate().expect("input should validate");
        assert_eq!(answers.participant_id.as_str(), "jdoe");
        assert_eq!(answers.native_language, "");
        assert_eq!(answers.program_use_only, None);
    }

    #[test]
    fn empty_input_reports_every_required_field() {
        let errors = DemographicsInput::default().validate().unwrap_err();
        assert_eq!(errors.len(), 7);
        assert_eq!(errors[0], "Q1 (ASURite) is required.");
    }

    #[test]
    fn conditional_answers_are_required_when_selected() {
        let mut input = complete_input();
        input.race_ethnicity = Some(RACE_ETHNICITY_OTHER.to_string());
        input.language_background = Some(NON_NATIVE_LANGUAGE_BACKGROUND.to_string());
        input.native_language = Some("Spanish".to_string());

        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Please specify your ethnicity.".to_string(),
                "Q9 (Years Studied English) is required.".to_string(),
                "Q10 (Years in US) is required.".to_string(),
            ]
        );
    }
}
