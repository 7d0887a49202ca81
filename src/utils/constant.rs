//! # Application Constants
//!
//! This module defines limits and default values used throughout the
//! registration service. Anything operators may want to change lives in
//! [`AppConfig`](crate::config::AppConfig) instead; these are the fallbacks.

/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_SIZE: usize = 5_000_000;

/// Request body limit for the submission endpoint.
///
/// Leaves headroom over [`MAX_PHOTO_SIZE`] for the text fields and the
/// multipart framing.
pub const MAX_REQUEST_BODY_BYTES: usize = 6 * 1024 * 1024;

/// MIME types accepted for the photo part.
pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Media store folder that uploaded photos are scoped under.
pub const DEFAULT_UPLOAD_FOLDER: &str = "course-registrations";

/// Worksheet range rows are appended to.
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A:D";

/// Address the server binds to when `BIND_ADDRESS` is not set.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8090";

/// OAuth2 scope granting write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub const DEFAULT_GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

/// Lifetime requested for service-account assertions, in seconds.
///
/// Google rejects assertions valid for longer than one hour.
pub const ASSERTION_LIFETIME_SECS: i64 = 60 * 60;

/// Messages returned to the submitter. The client only distinguishes success
/// from failure, so these never carry error detail.
pub const SUCCESS_MESSAGE: &str = "Data submitted successfully";
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";
pub const SUBMISSION_FAILED_MESSAGE: &str = "Failed to submit form";
pub const SPREADSHEET_FAILED_MESSAGE: &str = "Failed to save to Google Sheets";
