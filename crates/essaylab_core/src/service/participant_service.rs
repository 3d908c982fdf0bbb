//! Participant registry use case.

use crate::clock::Clock;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::timestamp::to_storage_precision;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::RepoResult;
use std::sync::Arc;

/// Registry facade normalizing ids before they reach storage.
pub struct ParticipantRegistry<R: ParticipantRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
}

impl<R: ParticipantRepository> ParticipantRegistry<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Creates or refreshes a participant.
    ///
    /// `consent = None` keeps whatever value is stored (or `false` for a new
    /// row).
    pub fn ensure_participant(
        &self,
        id: &ParticipantId,
        consent: Option<bool>,
    ) -> RepoResult<Participant> {
        self.repo
            .ensure_participant(id, consent, to_storage_precision(self.clock.now()))
    }

    pub fn get_participant(&self, id: &ParticipantId) -> RepoResult<Option<Participant>> {
        self.repo.get_participant(id)
    }
}
