//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"detail": ...}`: a list for form
//! validation, a single message otherwise. Storage details are logged and
//! never returned to the caller.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use essaylab_core::db::DbError;
use essaylab_core::{DemographicsServiceError, RepoError, SessionServiceError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Form answers failed validation; every message is returned.
    #[error("validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),

    /// Request body is not acceptable JSON for the endpoint.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    NotFound(String),

    /// Well-formed request refused by a session rule.
    #[error("{0}")]
    Rejected(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Validation(errors) => json!({ "detail": errors }),
            Self::InvalidBody(message) | Self::NotFound(message) | Self::Rejected(message) => {
                json!({ "detail": message })
            }
            Self::Internal(reason) => {
                error!("event=http_request module=http status=error error={}", reason);
                json!({ "detail": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidBody(value.body_text())
    }
}

impl From<SessionServiceError> for ApiError {
    fn from(value: SessionServiceError) -> Self {
        match value {
            SessionServiceError::NotFound(_) => Self::NotFound(value.to_string()),
            SessionServiceError::AlreadySubmitted(_) | SessionServiceError::TooLong { .. } => {
                Self::Rejected(value.to_string())
            }
            SessionServiceError::Repo(err) => err.into(),
        }
    }
}

impl From<DemographicsServiceError> for ApiError {
    fn from(value: DemographicsServiceError) -> Self {
        match value {
            DemographicsServiceError::Validation(errors) => Self::Validation(errors),
            DemographicsServiceError::Repo(err) => err.into(),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use essaylab_core::{SessionId, SessionServiceError};

    #[test]
    fn session_errors_map_to_statuses() {
        let not_found: ApiError = SessionServiceError::NotFound("x".to_string()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Invalid session_id");

        let duplicate: ApiError = SessionServiceError::AlreadySubmitted(SessionId::nil()).into();
        assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.to_string(), "Essay already submitted for this session.");

        let too_long: ApiError = SessionServiceError::TooLong {
            chars: 20_001,
            max: 20_000,
        }
        .into();
        assert_eq!(too_long.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(too_long.to_string(), "Essay exceeds 20000 characters.");
    }

    #[test]
    fn validation_and_body_errors_are_unprocessable() {
        assert_eq!(
            ApiError::Validation(vec!["Q2 (Gender) is required.".to_string()]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidBody("EOF".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal("disk full".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
