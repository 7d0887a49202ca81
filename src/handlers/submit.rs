//! # Submission Handler
//!
//! This module implements the registration endpoint. The flow is:
//!
//! 1. Read the `name`, `email`, `course` and `photo` parts from the multipart body
//! 2. In strict mode, reject missing parts and invalid values with `400`
//! 3. Upload the photo to the media store
//! 4. Append the row to the spreadsheet
//!
//! Steps 3 and 4 live in [`RegistrationService`](crate::services::registration::RegistrationService).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AppState, PhotoUpload, RegistrationForm, RegistrationRecord};
use crate::services::registration::SubmissionError;
use crate::utils::{constant::SUCCESS_MESSAGE, upload::PhotoValidator};

/// Response body for a recorded registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RegistrationRecord>,
}

/// The parts of the multipart body, each possibly absent.
#[derive(Debug, Default)]
struct SubmissionParts {
    name: Option<String>,
    email: Option<String>,
    course: Option<String>,
    photo: Option<PhotoUpload>,
}

impl SubmissionParts {
    fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.name)
            && present(&self.email)
            && present(&self.course)
            && self.photo.as_ref().is_some_and(|p| !p.is_empty())
    }

    fn into_form(self) -> RegistrationForm {
        RegistrationForm {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            course: self.course.unwrap_or_default(),
            photo: self.photo,
        }
    }
}

async fn read_parts(multipart: &mut Multipart) -> AppResult<SubmissionParts> {
    let mut parts = SubmissionParts::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!(error = %e, "Error reading multipart form");
        AppError::InvalidMultipart
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" | "email" | "course" => {
                let text = field.text().await.map_err(|e| {
                    error!(error = %e, field = %field_name, "Error reading text field");
                    AppError::InvalidMultipart
                })?;
                let slot = match field_name.as_str() {
                    "name" => &mut parts.name,
                    "email" => &mut parts.email,
                    _ => &mut parts.course,
                };
                *slot = Some(text);
            }
            "photo" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    error!(error = %e, "Error reading file data");
                    AppError::InvalidMultipart
                })?;
                trace!(size = data.len(), content_type = %content_type, "Photo part received");
                parts.photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {
                warn!(field_name = %field_name, "Unknown field in multipart form");
            }
        }
    }

    Ok(parts)
}

/// Records a course registration.
///
/// POST /api/submit MultipartForm
///
/// Accepts `multipart/form-data` with `name`, `email`, `course` and a
/// `photo` file, uploads the photo and appends one spreadsheet row.
///
/// # Returns
///
/// - `200 OK` - `{"message": "Data submitted successfully"}`, with `data`
///   when record echo is enabled
/// - `400 Bad Request` - Missing or invalid fields (strict mode only), or an
///   unreadable multipart body
/// - `500 Internal Server Error` - Upload or spreadsheet failure
#[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn submit_registration(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    debug!("Processing registration submission");

    let parts = read_parts(&mut multipart).await?;

    let submission = if state.submission.strict {
        if !parts.is_complete() {
            warn!("Submission is missing required fields");
            return Err(AppError::MissingFields);
        }

        let submission = parts.into_form().validate_submission().map_err(|errors| {
            warn!(?errors, "Submission failed validation");
            let message = errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_default();
            AppError::InvalidSubmission(message)
        })?;

        let photo = &submission.photo;
        let format = PhotoValidator::validate_image_format(&photo.content_type, &photo.data)
            .map_err(|e| {
                warn!(
                    error = %e,
                    content_type = %photo.content_type,
                    "Photo bytes do not match an accepted image format"
                );
                AppError::InvalidSubmission(e.to_string())
            })?;
        trace!(?format, "Photo format confirmed");

        submission
    } else {
        parts.into_form().into_unchecked_submission()
    };

    let record = state
        .registration
        .record(&submission)
        .await
        .map_err(|e| match e {
            SubmissionError::Append(_) if state.submission.distinct_sheet_errors => {
                AppError::SpreadsheetFailed
            }
            SubmissionError::Upload(_) | SubmissionError::Append(_) => AppError::SubmissionFailed,
        })?;

    info!(
        email = %record.email,
        course = %record.course,
        photo_url = %record.photo_url,
        "Form submission recorded"
    );

    let data = state.submission.echo_record.then_some(record);
    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            message: SUCCESS_MESSAGE.to_string(),
            data,
        }),
    ))
}
