//! # Application Configuration
//!
//! Every setting the service needs is read once at startup into an
//! [`AppConfig`], which is then handed to [`crate::app`]. Nothing downstream
//! reads the process environment.
//!
//! | Env Var                              | Default                   |
//! |--------------------------------------|---------------------------|
//! | `BIND_ADDRESS`                       | `0.0.0.0:8090`            |
//! | `CLOUDINARY_CLOUD_NAME`              | required                  |
//! | `CLOUDINARY_API_KEY`                 | required                  |
//! | `CLOUDINARY_API_SECRET[_FILE]`       | required                  |
//! | `GOOGLE_SHEETS_CLIENT_EMAIL`         | required                  |
//! | `GOOGLE_SHEETS_PRIVATE_KEY[_FILE]`   | required                  |
//! | `GOOGLE_SHEETS_SPREADSHEET_ID`       | required                  |
//! | `UPLOAD_FOLDER`                      | `course-registrations`    |
//! | `SHEET_RANGE`                        | `Sheet1!A:D`              |
//! | `SHEET_VALUE_INPUT_OPTION`           | `USER_ENTERED`            |
//! | `SUBMISSION_STRICT`                  | `true`                    |
//! | `SUBMISSION_DISTINCT_SHEET_ERRORS`   | `true`                    |
//! | `SUBMISSION_ECHO_RECORD`             | `false`                   |
//! | `SUBMISSION_COMPENSATE_UPLOAD`       | `true`                    |
//! | `OUTBOUND_TIMEOUT_SECS`              | unset (no timeout)        |

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::services::spreadsheet::{UnknownValueInputOption, ValueInputOption};
use crate::utils::{
    constant::*,
    secret::{get_secret, unescape_newlines},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("env variable `{0}` should be set")]
    Missing(&'static str),
    #[error("env variable `{var}` is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Credentials and endpoints for the media store.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

/// Service-account credentials and target for the spreadsheet service.
#[derive(Debug, Clone)]
pub struct GoogleSheetsConfig {
    pub client_email: String,
    /// PEM-encoded RSA key with real newlines.
    pub private_key: String,
    pub spreadsheet_id: String,
    pub token_uri: String,
    pub api_base: String,
    /// How appended cells are interpreted.
    pub value_input_option: ValueInputOption,
}

/// How the submission endpoint behaves.
///
/// Two historical variants of the endpoint disagreed on validation and on
/// error detail; each difference is a toggle here. The defaults are the
/// stricter behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Reject missing or invalid fields with 400 before any external call.
    pub strict: bool,
    /// Report spreadsheet failures with their own error message.
    pub distinct_sheet_errors: bool,
    /// Echo the recorded row in the success response.
    pub echo_record: bool,
    /// Delete the uploaded photo when the row append fails.
    pub compensate_upload: bool,
    /// Media store folder uploads are scoped under.
    pub upload_folder: String,
    /// Worksheet range rows are appended to.
    pub sheet_range: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            strict: true,
            distinct_sheet_errors: true,
            echo_record: false,
            compensate_upload: true,
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            sheet_range: DEFAULT_SHEET_RANGE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub outbound_timeout: Option<Duration>,
    pub cloudinary: CloudinaryConfig,
    pub google_sheets: GoogleSheetsConfig,
    pub submission: SubmissionConfig,
}

impl AppConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an unset required variable and
    /// [`ConfigError::Invalid`] for a value that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), get_secret)
    }

    /// Builds the configuration from arbitrary lookup functions.
    ///
    /// `var` resolves plain variables; `secret` resolves a secret given its
    /// `_FILE` variable name and its plain variable name.
    pub fn from_lookup<V, S>(var: V, secret: S) -> Result<Self, ConfigError>
    where
        V: Fn(&str) -> Option<String>,
        S: Fn(&str, &str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            var(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let flag = |name: &'static str, default: bool| -> Result<bool, ConfigError> {
            match var(name) {
                None => Ok(default),
                Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::Invalid {
                    var: name,
                    reason: format!("expected a boolean, got `{raw}`"),
                }),
            }
        };

        let api_secret = secret("CLOUDINARY_API_SECRET_FILE", "CLOUDINARY_API_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("CLOUDINARY_API_SECRET"))?;
        let private_key = secret("GOOGLE_SHEETS_PRIVATE_KEY_FILE", "GOOGLE_SHEETS_PRIVATE_KEY")
            .filter(|v| !v.is_empty())
            .map(|raw| unescape_newlines(&raw))
            .ok_or(ConfigError::Missing("GOOGLE_SHEETS_PRIVATE_KEY"))?;

        let value_input_option = match var("SHEET_VALUE_INPUT_OPTION") {
            None => ValueInputOption::default(),
            Some(raw) => raw.parse().map_err(|e: UnknownValueInputOption| ConfigError::Invalid {
                var: "SHEET_VALUE_INPUT_OPTION",
                reason: e.to_string(),
            })?,
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret,
            api_base: var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|| DEFAULT_CLOUDINARY_API_BASE.to_string()),
        };

        let google_sheets = GoogleSheetsConfig {
            client_email: required("GOOGLE_SHEETS_CLIENT_EMAIL")?,
            private_key,
            spreadsheet_id: required("GOOGLE_SHEETS_SPREADSHEET_ID")?,
            token_uri: var("GOOGLE_TOKEN_URI")
                .unwrap_or_else(|| DEFAULT_GOOGLE_TOKEN_URI.to_string()),
            api_base: var("GOOGLE_SHEETS_API_BASE")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
            value_input_option,
        };

        let defaults = SubmissionConfig::default();
        let submission = SubmissionConfig {
            strict: flag("SUBMISSION_STRICT", defaults.strict)?,
            distinct_sheet_errors: flag(
                "SUBMISSION_DISTINCT_SHEET_ERRORS",
                defaults.distinct_sheet_errors,
            )?,
            echo_record: flag("SUBMISSION_ECHO_RECORD", defaults.echo_record)?,
            compensate_upload: flag("SUBMISSION_COMPENSATE_UPLOAD", defaults.compensate_upload)?,
            upload_folder: var("UPLOAD_FOLDER").unwrap_or(defaults.upload_folder),
            sheet_range: var("SHEET_RANGE").unwrap_or(defaults.sheet_range),
        };

        let outbound_timeout = match var("OUTBOUND_TIMEOUT_SECS") {
            None => None,
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var: "OUTBOUND_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
        };

        let config = Self {
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            outbound_timeout,
            cloudinary,
            google_sheets,
            submission,
        };

        info!(
            bind_address = %config.bind_address,
            cloud_name = %config.cloudinary.cloud_name,
            spreadsheet_id = %config.google_sheets.spreadsheet_id,
            submission = ?config.submission,
            "Loaded configuration"
        );
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
