//! Domain model for participants, writing sessions and demographics.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and the HTTP layer.
//! - Own pure derivations (id normalization, essay metrics, durations).
//!
//! # Invariants
//! - Participant identifiers are always trimmed and lowercased.
//! - `WritingSession::submitted_at` is the only source of truth for state.
//! - Records reference each other by key; nothing holds back pointers.

pub mod demographics;
pub mod essay;
pub mod participant;
pub mod session;
pub mod timestamp;
