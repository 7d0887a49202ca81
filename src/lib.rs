//! # Course Registration Service
//!
//! Accepts a registration form (name, email, course, photo), uploads the
//! photo to a media store and appends the record to a spreadsheet.
//!
//! ## Modules
//!
//! - [`client`] - Form client that validates locally and submits the multipart request
//! - [`config`] - Configuration read once at startup
//! - [`handlers`] - HTTP request handlers
//! - [`models`] - Registration types and shared application state
//! - [`services`] - Media store, spreadsheet and registration services
//! - [`utils`] - Constants, photo validation and secret loading

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AppConfig, SubmissionConfig};
use crate::error::StartupError;
use crate::handlers::{health_check, submit_registration};
use crate::models::AppState;
use crate::services::{
    media_store::{CloudinaryClient, MediaStore},
    spreadsheet::{GoogleSheetsClient, SpreadsheetService},
};
use crate::utils::constant::MAX_REQUEST_BODY_BYTES;

/// Path the registration form posts to.
pub const SUBMIT_PATH: &str = "/api/submit";

/// Creates an Axum router backed by Cloudinary and Google Sheets.
///
/// Both clients share one `reqwest::Client`, built with the configured
/// outbound timeout if there is one.
///
/// # Errors
///
/// Returns [`StartupError`] if the HTTP client cannot be built or the
/// service-account private key cannot be parsed.
pub fn app(config: &AppConfig) -> Result<Router, StartupError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.outbound_timeout {
        builder = builder.timeout(timeout);
    }
    let http_client = builder.build()?;

    let media_store: Arc<dyn MediaStore> =
        Arc::new(CloudinaryClient::new(&config.cloudinary, http_client.clone()));
    let spreadsheet: Arc<dyn SpreadsheetService> =
        Arc::new(GoogleSheetsClient::new(&config.google_sheets, http_client)?);

    Ok(app_with_services(
        media_store,
        spreadsheet,
        config.submission.clone(),
    ))
}

/// Creates an Axum router over arbitrary media store and spreadsheet
/// implementations.
///
/// # Arguments
///
/// * `media_store` - Where photos are uploaded
/// * `spreadsheet` - Where registration rows are appended
/// * `submission` - Endpoint behaviour toggles
pub fn app_with_services(
    media_store: Arc<dyn MediaStore>,
    spreadsheet: Arc<dyn SpreadsheetService>,
    submission: SubmissionConfig,
) -> Router {
    info!(strict = submission.strict, "Building router");

    let state = Arc::new(AppState::new(media_store, spreadsheet, submission));

    Router::new()
        .route("/health-check", get(health_check))
        .route(
            SUBMIT_PATH,
            post(submit_registration).layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
