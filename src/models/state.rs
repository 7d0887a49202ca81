use std::sync::Arc;

use tracing::{debug, info};

use crate::config::SubmissionConfig;
use crate::services::{
    media_store::MediaStore, registration::RegistrationService, spreadsheet::SpreadsheetService,
};

/// Application state shared across requests. Needs to be thread-safe.
///
/// Nothing in here is mutated after startup.
pub struct AppState {
    /// Endpoint behaviour toggles.
    pub submission: SubmissionConfig,
    /// Upload-then-append sequence over the configured providers.
    pub registration: RegistrationService,
}

impl AppState {
    /// Creates a new application state with the provided services.
    ///
    /// # Arguments
    ///
    /// * `media_store` - Where photos are uploaded
    /// * `spreadsheet` - Where registration rows are appended
    /// * `submission` - Endpoint behaviour toggles
    pub fn new(
        media_store: Arc<dyn MediaStore>,
        spreadsheet: Arc<dyn SpreadsheetService>,
        submission: SubmissionConfig,
    ) -> Self {
        info!("Initializing application state");
        debug!(?submission, "Submission behaviour");

        let registration = RegistrationService::new(media_store, spreadsheet, &submission);
        Self {
            submission,
            registration,
        }
    }
}
