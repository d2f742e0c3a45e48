use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What is wrong with a submitted field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Invalid(String),
}

/// Rejected client input, naming the first offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            problem: FieldProblem::Missing,
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            problem: FieldProblem::Invalid(reason.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "missing required field: {}", self.field),
            FieldProblem::Invalid(reason) => write!(f, "invalid field {}: {}", self.field, reason),
        }
    }
}

/// Attachment store failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to write attachment: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to upload attachment: {0}")]
    Upload(String),
}

/// Review repository failures
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by the ingestion and dashboard operations
#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Attachment storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Review persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Payload too large")]
    PayloadTooLarge,
}

impl FeedbackError {
    /// Label used for logs and the rejection counter
    pub fn reason(&self) -> &'static str {
        match self {
            FeedbackError::Validation(_) => "validation",
            FeedbackError::Storage(_) => "storage",
            FeedbackError::Persistence(_) => "persistence",
            FeedbackError::Unauthorized => "unauthorized",
            FeedbackError::PayloadTooLarge => "payload_too_large",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedbackError::Validation(_) => StatusCode::BAD_REQUEST,
            FeedbackError::Unauthorized => StatusCode::UNAUTHORIZED,
            FeedbackError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FeedbackError::Storage(_) | FeedbackError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for FeedbackError {
    fn into_response(self) -> Response {
        let (error, code) = match &self {
            FeedbackError::Validation(e) => (e.to_string(), "VALIDATION_ERROR"),
            FeedbackError::Unauthorized => ("Unauthorized".to_string(), "UNAUTHORIZED"),
            FeedbackError::PayloadTooLarge => {
                ("Payload too large".to_string(), "PAYLOAD_TOO_LARGE")
            }
            // Internal details stay in the logs
            FeedbackError::Storage(_) => ("Internal Server Error".to_string(), "STORAGE_ERROR"),
            FeedbackError::Persistence(_) => {
                ("Internal Server Error".to_string(), "PERSISTENCE_ERROR")
            }
        };

        (
            self.status_code(),
            Json(ErrorResponse {
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
