//! # Health Check Handler
//!
//! Liveness probe for load balancers and deployment tooling. It does not
//! contact the media store or the spreadsheet service.

use axum::http::StatusCode;
use tracing::{debug, instrument};

/// Health check endpoint that returns 200 OK with an empty body.
#[instrument]
pub async fn health_check() -> StatusCode {
    debug!("Health check endpoint accessed");
    StatusCode::OK
}
