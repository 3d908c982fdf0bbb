//! Demographics use case: validate, then upsert alongside the participant.

use crate::clock::Clock;
use crate::model::demographics::{DemographicsInput, DemographicsRecord};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::timestamp::to_storage_precision;
use crate::repo::demographics_repo::DemographicsRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Service error for demographics use cases.
#[derive(Debug)]
pub enum DemographicsServiceError {
    /// Every failed rule, in form order.
    Validation(Vec<String>),
    Repo(RepoError),
}

impl Display for DemographicsServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "invalid demographics: {}", errors.join(" ")),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DemographicsServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Validation(_) => None,
        }
    }
}

impl From<RepoError> for DemographicsServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDemographics {
    pub participant: Participant,
    pub record: DemographicsRecord,
}

pub struct DemographicsService<R: DemographicsRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
}

impl<R: DemographicsRepository> DemographicsService<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Validates `input` and stores it. Nothing is written when validation
    /// fails.
    pub fn save_demographics(
        &mut self,
        input: &DemographicsInput,
    ) -> Result<SavedDemographics, DemographicsServiceError> {
        let answers = input
            .validate()
            .map_err(DemographicsServiceError::Validation)?;
        let (participant, record) = self.repo
            .save_demographics(&answers, to_storage_precision(self.clock.now()))?;

        info!(
            "event=demographics_save module=demographics status=ok participant={} program_use_only={}",
            participant.id, participant.program_use_only
        );
        Ok(SavedDemographics {
            participant,
            record,
        })
    }

    pub fn get_demographics(
        &self,
        participant_id: &ParticipantId,
    ) -> RepoResult<Option<DemographicsRecord>> {
        self.repo.get_demographics(participant_id)
    }
}
