//! # Registration Service
//!
//! Records a validated submission in two steps:
//!
//! 1. Upload the photo to the [`MediaStore`] (stage)
//! 2. Append `[name, email, course, photo_url]` to the [`SpreadsheetService`] (confirm)
//!
//! The append is never attempted when the upload fails, and it is attempted
//! exactly once. When the append fails the uploaded photo is deleted again
//! (compensate) unless compensation is switched off. Compensation is
//! best-effort: its own failure is logged and does not change the outcome.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SubmissionConfig;
use crate::models::{RegistrationRecord, RegistrationSubmission, UploadedPhoto};
use crate::services::media_store::{MediaStore, MediaStoreError};
use crate::services::spreadsheet::{SpreadsheetError, SpreadsheetService};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("photo upload failed: {0}")]
    Upload(#[source] MediaStoreError),
    #[error("spreadsheet append failed: {0}")]
    Append(#[source] SpreadsheetError),
}

pub struct RegistrationService {
    media_store: Arc<dyn MediaStore>,
    spreadsheet: Arc<dyn SpreadsheetService>,
    upload_folder: String,
    sheet_range: String,
    compensate_upload: bool,
}

impl RegistrationService {
    pub fn new(
        media_store: Arc<dyn MediaStore>,
        spreadsheet: Arc<dyn SpreadsheetService>,
        config: &SubmissionConfig,
    ) -> Self {
        Self {
            media_store,
            spreadsheet,
            upload_folder: config.upload_folder.clone(),
            sheet_range: config.sheet_range.clone(),
            compensate_upload: config.compensate_upload,
        }
    }

    /// Uploads the photo, then appends the row.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Upload`] - Nothing was recorded
    /// - [`SubmissionError::Append`] - The photo was uploaded but no row exists
    #[instrument(skip_all, fields(course = %submission.course, folder = %self.upload_folder))]
    pub async fn record(
        &self,
        submission: &RegistrationSubmission,
    ) -> Result<RegistrationRecord, SubmissionError> {
        let uploaded = self
            .media_store
            .upload(&submission.photo, &self.upload_folder)
            .await
            .map_err(|e| {
                error!(error = %e, "Photo upload failed, no row will be appended");
                SubmissionError::Upload(e)
            })?;

        debug!(photo_url = %uploaded.secure_url, "Photo staged, appending row");

        let row = submission.to_row(&uploaded.secure_url);
        if let Err(e) = self.spreadsheet.append_row(&self.sheet_range, &row).await {
            error!(error = %e, range = %self.sheet_range, "Failed to append row");
            if self.compensate_upload {
                self.discard_upload(&uploaded).await;
            } else {
                warn!(public_id = %uploaded.public_id, "Leaving orphaned photo in media store");
            }
            return Err(SubmissionError::Append(e));
        }

        info!(photo_url = %uploaded.secure_url, "Registration recorded");
        Ok(RegistrationRecord {
            name: submission.name.clone(),
            email: submission.email.clone(),
            course: submission.course.clone(),
            photo_url: uploaded.secure_url,
        })
    }

    /// Attempts to delete a staged photo after a failed append.
    ///
    /// Errors are logged but not returned, the append error is the one the
    /// caller needs to see.
    async fn discard_upload(&self, uploaded: &UploadedPhoto) {
        if let Err(e) = self.media_store.delete(&uploaded.public_id).await {
            error!(
                public_id = %uploaded.public_id,
                error = %e,
                "Failed to remove orphaned photo during error recovery"
            );
        } else {
            debug!(public_id = %uploaded.public_id, "Orphaned photo removed");
        }
    }
}
