//! Core domain logic for the essay writing-session service.
//! This crate is the single source of truth for session invariants.

pub mod backup;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use backup::{
    essay_backup_key, BackupError, BackupOutcome, DirectoryBackupSink, EssayBackup,
    EssayBackupSink, ObjectStoreConfig, ServerSideEncryption,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{init_logging, logging_status, LogTarget};
pub use model::demographics::{DemographicsInput, DemographicsRecord};
pub use model::essay::MAX_ESSAY_CHARS;
pub use model::participant::{Participant, ParticipantId};
pub use model::session::{SessionId, SessionState, WritingSession};
pub use repo::demographics_repo::{DemographicsRepository, SqliteDemographicsRepository};
pub use repo::participant_repo::{ParticipantRepository, SqliteParticipantRepository};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::demographics_service::{
    DemographicsService, DemographicsServiceError, SavedDemographics,
};
pub use service::participant_service::ParticipantRegistry;
pub use service::session_service::{
    SessionService, SessionServiceError, StartedSession, SubmittedEssay,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
