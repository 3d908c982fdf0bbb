//! Best-effort secondary storage for submitted essay text.
//!
//! # Responsibility
//! - Define the sink contract consumed by the submission pipeline.
//! - Derive deterministic object keys.
//! - Absorb every sink failure so the primary commit is never affected.
//!
//! # Invariants
//! - `EssayBackup::store` never returns an error and never panics outward.
//! - The essay body is never written to logs.

use crate::model::participant::ParticipantId;
use crate::model::session::SessionId;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub mod config;
pub mod directory;

pub use config::{normalize_prefix, ObjectStoreConfig, ServerSideEncryption};
pub use directory::DirectoryBackupSink;

pub type BackupResult<T> = Result<T, BackupError>;

/// Failure reported by a backup sink.
#[derive(Debug)]
pub enum BackupError {
    Io(std::io::Error),
    /// Key would escape the sink's namespace.
    InvalidKey(String),
    /// Sink cannot accept work right now (queue full, worker gone, not configured).
    Unavailable(String),
    /// Remote store rejected or failed the write.
    Remote(String),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "backup io error: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid backup key `{key}`"),
            Self::Unavailable(reason) => write!(f, "backup sink unavailable: {reason}"),
            Self::Remote(reason) => write!(f, "backup write failed: {reason}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Destination for essay copies.
pub trait EssayBackupSink: Send + Sync {
    /// Stores `text` under `key` and returns the key actually written
    /// (including any configured prefix).
    fn put_text(&self, key: &str, text: &str) -> BackupResult<String>;
}

/// Builds `essays/{yyyy}/{mm}/{dd}/{participant}/{session}.txt`.
///
/// The date is the UTC date of `submitted_at`.
pub fn essay_backup_key(
    submitted_at: DateTime<Utc>,
    participant_id: &ParticipantId,
    session_id: SessionId,
) -> String {
    format!(
        "essays/{}/{}/{}.txt",
        submitted_at.format("%Y/%m/%d"),
        participant_id.as_str(),
        session_id
    )
}

/// Result of one backup attempt, reported for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// No sink configured.
    Disabled,
    Stored { key: String },
    Failed { key: String, reason: String },
}

/// Injected backup handle: either disabled or wrapping one sink.
#[derive(Clone, Default)]
pub struct EssayBackup {
    sink: Option<Arc<dyn EssayBackupSink>>,
}

impl EssayBackup {
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn new(sink: Arc<dyn EssayBackupSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Attempts one write; all failures are logged and folded into the outcome.
    pub fn store(
        &self,
        participant_id: &ParticipantId,
        session_id: SessionId,
        text: &str,
        submitted_at: DateTime<Utc>,
    ) -> BackupOutcome {
        let Some(sink) = self.sink.as_ref() else {
            return BackupOutcome::Disabled;
        };

        let key = essay_backup_key(submitted_at, participant_id, session_id);
        let attempt = catch_unwind(AssertUnwindSafe(|| sink.put_text(&key, text)));
        match attempt {
            Ok(Ok(stored_key)) => {
                info!(
                    "event=essay_backup module=backup status=ok session_id={} key={}",
                    session_id, stored_key
                );
                BackupOutcome::Stored { key: stored_key }
            }
            Ok(Err(err)) => {
                warn!(
                    "event=essay_backup module=backup status=error session_id={} key={} error={}",
                    session_id, key, err
                );
                BackupOutcome::Failed {
                    key,
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    "event=essay_backup module=backup status=error session_id={} key={} error=sink_panicked",
                    session_id, key
                );
                BackupOutcome::Failed {
                    key,
                    reason: "backup sink panicked".to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for EssayBackup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EssayBackup")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
