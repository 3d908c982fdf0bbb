//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the participant/session/demographics
//!   use cases.
//! - Own "now" through an injected clock so derived values are testable.

pub mod demographics_service;
pub mod participant_service;
pub mod session_service;
