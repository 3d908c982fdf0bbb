//! Participant identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Normalized participant identifier (trimmed, lowercased, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Normalizes a raw caller-supplied identifier.
    ///
    /// Returns `None` when nothing remains after trimming.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted participant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Primary key, stored as `participants.asurite`.
    pub id: ParticipantId,
    /// Consent flag; reflects the most recently supplied value.
    pub program_use_only: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::ParticipantId;

    #[test]
    fn normalize_trims_and_lowercases() {
        let id = ParticipantId::normalize("  JDoe12 \n").expect("id should normalize");
        assert_eq!(id.as_str(), "jdoe12");
    }

    #[test]
    fn normalize_rejects_blank_input() {
        assert!(ParticipantId::normalize("").is_none());
        assert!(ParticipantId::normalize(" \t ").is_none());
    }

    #[test]
    fn serializes_as_the_normalized_string() {
        let id = ParticipantId::normalize(" JDoe ").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("jdoe"));
    }
}
