use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::CredentialError;
use crate::config::ConfigError;
use crate::repository::{ConstraintKind, RepoError};

/// Partial unique index keeping active emails distinct.
const ACTIVE_EMAIL_CONSTRAINT: &str = "users_active_email_key";

/// Failures surfaced by the use-case operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: String, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("transaction failed")]
    TransactionFailure {
        #[source]
        source: RepoError,
    },

    #[error("cannot add the event creator as an attendee")]
    CannotAddCreatorAsAttendee,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized { .. } | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::CannotAddCreatorAsAttendee => StatusCode::BAD_REQUEST,
            AppError::TransactionFailure { .. }
            | AppError::Config { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { entity, id } => AppError::NotFound {
                entity: entity.to_string(),
                id,
            },
            RepoError::ConstraintViolation {
                kind: ConstraintKind::Unique,
                constraint,
                detail,
            } => {
                warn!(%detail, "unique constraint rejected write");
                let message = match constraint.as_deref() {
                    Some(ACTIVE_EMAIL_CONSTRAINT) => "email already registered",
                    _ => "resource already exists",
                };
                AppError::Conflict {
                    message: message.into(),
                }
            }
            RepoError::CannotAddCreatorAsAttendee => AppError::CannotAddCreatorAsAttendee,
            other => AppError::TransactionFailure { source: other },
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Config(message) => AppError::Config { message },
            CredentialError::InvalidToken(_) => AppError::unauthorized("invalid token"),
            CredentialError::ExpiredToken => AppError::unauthorized("token expired"),
            CredentialError::Hashing(message) => AppError::Internal { message },
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorContent,
}

#[derive(Debug, Serialize)]
pub struct ErrorContent {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, field) = match &self {
            AppError::Validation { field, reason } => (reason.clone(), Some(field.clone())),
            AppError::TransactionFailure { source } => {
                error!(error = %source, "store operation failed");
                ("Internal server error".to_string(), None)
            }
            AppError::Config { message } | AppError::Internal { message } => {
                error!(error = %message, "request failed");
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            error: ErrorContent {
                code: status.as_u16(),
                message,
                field,
            },
        };
        (status, Json(body)).into_response()
    }
}
