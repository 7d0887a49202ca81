//! # Form Client
//!
//! Client side of the registration form. It validates the four fields
//! locally with the same rules the server applies, sends one multipart
//! request and reports the outcome:
//!
//! - invalid input is rejected before any network call
//! - only one submission may be in flight at a time
//! - on success the form is cleared
//! - on failure the form is left as is so the user can correct and retry
//!
//! There is no automatic retry.

use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::SUBMIT_PATH;
use crate::handlers::SubmitResponse;
use crate::models::{FieldError, RegistrationForm, RegistrationSubmission};

pub const SUCCESS_NOTIFICATION: &str = "Your form has been submitted successfully.";
pub const FAILURE_NOTIFICATION: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("a submission is already in progress")]
    InFlight,
    #[error("server rejected the submission with status {0}")]
    Rejected(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Notification text to surface for this error, if any.
    ///
    /// Field errors are shown next to their inputs and a blocked
    /// resubmission is silent, so only request failures produce one.
    pub fn notification(&self) -> Option<&'static str> {
        match self {
            ClientError::Rejected(_) | ClientError::Transport(_) => Some(FAILURE_NOTIFICATION),
            ClientError::Invalid(_) | ClientError::InFlight => None,
        }
    }
}

/// Result of an accepted submission.
#[derive(Debug)]
pub struct SubmitOutcome {
    /// Message returned by the server.
    pub message: Option<String>,
    pub notification: &'static str,
}

/// Clears the in-flight flag when the request finishes or is cancelled.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FormClient {
    endpoint: String,
    http_client: reqwest::Client,
    in_flight: AtomicBool,
}

impl FormClient {
    /// Creates a client posting to `{base_url}/api/submit`.
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: &str, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: format!("{}{SUBMIT_PATH}", base_url.trim_end_matches('/')),
            http_client,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a submission is currently in flight.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validates and submits the form.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Invalid`] - Local validation failed, nothing was sent
    /// - [`ClientError::InFlight`] - Another submission has not finished yet
    /// - [`ClientError::Rejected`] - The server answered with a non-success status
    /// - [`ClientError::Transport`] - The request could not be completed
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn submit(&self, form: &mut RegistrationForm) -> Result<SubmitOutcome, ClientError> {
        let submission = form.validate_submission().map_err(|errors| {
            debug!(?errors, "Form failed local validation");
            ClientError::Invalid(errors)
        })?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Submission already in progress");
            return Err(ClientError::InFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(to_multipart(&submission)?)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Error submitting form");
                ClientError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Server rejected submission");
            return Err(ClientError::Rejected(status));
        }

        let message = response
            .json::<SubmitResponse>()
            .await
            .ok()
            .map(|body| body.message);

        info!("Form submitted successfully");
        form.reset();

        Ok(SubmitOutcome {
            message,
            notification: SUCCESS_NOTIFICATION,
        })
    }
}

fn to_multipart(submission: &RegistrationSubmission) -> Result<Form, reqwest::Error> {
    let photo = &submission.photo;
    let part = Part::bytes(photo.data.to_vec())
        .file_name(photo.file_name.clone().unwrap_or_else(|| "photo".to_string()))
        .mime_str(&photo.content_type)?;

    Ok(Form::new()
        .text("name", submission.name.clone())
        .text("email", submission.email.clone())
        .text("course", submission.course.clone())
        .part("photo", part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        assert_eq!(
            FormClient::new("http://127.0.0.1:8090/").endpoint(),
            "http://127.0.0.1:8090/api/submit"
        );
    }

    #[test]
    fn only_request_failures_notify() {
        assert_eq!(
            ClientError::Rejected(StatusCode::INTERNAL_SERVER_ERROR).notification(),
            Some(FAILURE_NOTIFICATION)
        );
        assert_eq!(ClientError::InFlight.notification(), None);
        assert_eq!(ClientError::Invalid(Vec::new()).notification(), None);
    }
}
