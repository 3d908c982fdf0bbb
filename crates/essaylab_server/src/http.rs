//! HTTP endpoint handlers.
//!
//! Each handler parses its JSON body, then runs the core use case on the
//! blocking pool against a freshly opened connection.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use essaylab_core::{
    DemographicsInput, DemographicsService, ParticipantId, SessionService,
    SqliteDemographicsRepository, SqliteSessionRepository,
};

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Liveness probe.
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ok".to_string(),
    })
}

/// Demographics form; snake_case and legacy PascalCase keys are both accepted.
#[derive(Debug, Default, Deserialize)]
pub struct DemographicsRequest {
    #[serde(default, alias = "ASURite")]
    pub asurite: Option<String>,
    #[serde(default, alias = "Gender")]
    pub gender: Option<String>,
    #[serde(default, alias = "Age")]
    pub age: Option<String>,
    #[serde(default, alias = "Race_Ethnicity")]
    pub race_ethnicity: Option<String>,
    #[serde(default, alias = "Race_Ethnicity_Specify")]
    pub race_ethnicity_specify: Option<String>,
    #[serde(default, alias = "Major")]
    pub major: Option<String>,
    #[serde(default, alias = "Major_Category")]
    pub major_category: Option<String>,
    #[serde(default, alias = "Major_Category_Specify")]
    pub major_category_specify: Option<String>,
    #[serde(default, alias = "Language_Background")]
    pub language_background: Option<String>,
    #[serde(default, alias = "Native_Language")]
    pub native_language: Option<String>,
    #[serde(default, alias = "Years_Studied_English")]
    pub years_studied_english: Option<String>,
    #[serde(default, alias = "Years_in_US")]
    pub years_in_us: Option<String>,
    #[serde(default)]
    pub program_use_only: Option<bool>,
}

impl From<DemographicsRequest> for DemographicsInput {
    fn from(value: DemographicsRequest) -> Self {
        Self {
            asurite: value.asurite,
            gender: value.gender,
            age: value.age,
            race_ethnicity: value.race_ethnicity,
            race_ethnicity_specify: value.race_ethnicity_specify,
            major: value.major,
            major_category: value.major_category,
            major_category_specify: value.major_category_specify,
            language_background: value.language_background,
            native_language: value.native_language,
            years_studied_english: value.years_studied_english,
            years_in_us: value.years_in_us,
            program_use_only: value.program_use_only,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DemographicsResponse {
    pub asurite: String,
    pub saved: bool,
}

pub async fn save_demographics(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DemographicsRequest>, JsonRejection>,
) -> Result<Json<DemographicsResponse>, ApiError> {
    let Json(request) = payload?;
    let input = DemographicsInput::from(request);
    let clock = state.clock.clone();

    let saved = state
        .with_connection(move |conn| {
            let mut service =
                DemographicsService::new(SqliteDemographicsRepository::new(conn), clock);
            Ok(service.save_demographics(&input)?)
        })
        .await?;

    info!(
        "event=http_request module=http route=demographics status=ok participant={}",
        saved.participant.id
    );
    Ok(Json(DemographicsResponse {
        asurite: saved.participant.id.to_string(),
        saved: true,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default, alias = "ASURite")]
    pub asurite: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let Json(request) = payload?;
    let participant_id = request
        .asurite
        .as_deref()
        .and_then(ParticipantId::normalize)
        .ok_or_else(|| {
            ApiError::Validation(vec!["ASURite is required to start a session.".to_string()])
        })?;
    let clock = state.clock.clone();
    let backup = state.backup.clone();

    let started = state
        .with_connection(move |conn| {
            let mut service =
                SessionService::new(SqliteSessionRepository::new(conn), clock, backup);
            Ok(service.start_session(&participant_id)?)
        })
        .await?;

    Ok(Json(StartSessionResponse {
        session_id: started.session_id.to_string(),
        started_at: started.started_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitEssayRequest {
    #[serde(default, alias = "Session_Id")]
    pub session_id: Option<String>,
    #[serde(default, alias = "Essay_Text")]
    pub essay_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitEssayResponse {
    pub session_id: String,
    pub submitted_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub word_count: u32,
    pub char_count: u32,
}

pub async fn submit_essay(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitEssayRequest>, JsonRejection>,
) -> Result<Json<SubmitEssayResponse>, ApiError> {
    let Json(request) = payload?;
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(vec!["session_id is required.".to_string()]))?;
    let essay_text = request.essay_text;
    let clock = state.clock.clone();
    let backup = state.backup.clone();

    let submitted = state
        .with_connection(move |conn| {
            let service = SessionService::new(SqliteSessionRepository::new(conn), clock, backup);
            Ok(service.submit_essay(&session_id, essay_text.as_deref())?)
        })
        .await?;

    Ok(Json(SubmitEssayResponse {
        session_id: submitted.session_id.to_string(),
        submitted_at: submitted.submitted_at,
        duration_seconds: submitted.duration_seconds,
        word_count: submitted.word_count,
        char_count: submitted.char_count,
    }))
}
