//! # Centralized Error Handling
//!
//! This module maps every failure the submission endpoint can hit onto a
//! JSON error response. Detail stays in the logs; the submitter only ever
//! sees one of a few fixed messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::google_auth::GoogleAuthError;
use crate::utils::constant::*;

/// Errors surfaced at the HTTP boundary.
///
/// Causes are logged where they happen, so none of these variants carry the
/// underlying error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AppError {
    #[error("missing required fields")]
    MissingFields,

    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("invalid multipart data")]
    InvalidMultipart,

    #[error("submission failed")]
    SubmissionFailed,

    #[error("spreadsheet append failed")]
    SpreadsheetFailed,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingFields => (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE.to_string()),
            AppError::InvalidSubmission(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidMultipart => {
                (StatusCode::BAD_REQUEST, "Invalid multipart data".to_string())
            }
            AppError::SubmissionFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SUBMISSION_FAILED_MESSAGE.to_string(),
            ),
            AppError::SpreadsheetFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SPREADSHEET_FAILED_MESSAGE.to_string(),
            ),
        };

        let body = Json(ErrorBody { error: message });
        (status, body).into_response()
    }
}

/// Convenience Result type alias that uses AppError as the error type.
pub type AppResult<T> = Result<T, AppError>;

/// Errors that stop the server from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid spreadsheet credentials: {0}")]
    Credentials(#[from] GoogleAuthError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
}
