//! # Spreadsheet Service
//!
//! Row storage behind the [`SpreadsheetService`] trait.
//!
//! ## Implementations
//!
//! - [`GoogleSheetsClient`] - Appends rows through the Google Sheets v4 API,
//!   authenticating as a service account on every call

use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::GoogleSheetsConfig;
use crate::services::google_auth::{GoogleAuthError, ServiceAccountAuth};

/// Errors that can occur while appending to the spreadsheet
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("authentication failed: {0}")]
    Auth(#[from] GoogleAuthError),
    #[error("invalid spreadsheet endpoint: {0}")]
    Endpoint(String),
    #[error("network request to spreadsheet API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("spreadsheet API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

/// Trait for tabular row storage
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Appends one row after the last filled row of `range`.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadsheetError`] if authentication or the append call fails.
    async fn append_row(&self, range: &str, row: &[String]) -> Result<(), SpreadsheetError>;
}

/// How the spreadsheet interprets appended values.
///
/// `UserEntered` parses input as if typed into the UI, so formulas and
/// locale-specific numbers and dates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueInputOption {
    Raw,
    #[default]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected RAW or USER_ENTERED, got `{0}`")]
pub struct UnknownValueInputOption(pub String);

impl FromStr for ValueInputOption {
    type Err = UnknownValueInputOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RAW" => Ok(ValueInputOption::Raw),
            "USER_ENTERED" => Ok(ValueInputOption::UserEntered),
            _ => Err(UnknownValueInputOption(s.to_string())),
        }
    }
}

/// Google Sheets backed row storage.
pub struct GoogleSheetsClient {
    auth: ServiceAccountAuth,
    spreadsheet_id: String,
    api_base: String,
    value_input_option: ValueInputOption,
    http_client: reqwest::Client,
}

impl GoogleSheetsClient {
    /// Creates a client for the configured spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleAuthError::InvalidKey`] if the private key cannot be parsed.
    pub fn new(
        config: &GoogleSheetsConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, GoogleAuthError> {
        info!(
            spreadsheet_id = %config.spreadsheet_id,
            client_email = %config.client_email,
            value_input_option = config.value_input_option.as_str(),
            "Initializing Google Sheets client"
        );

        let auth = ServiceAccountAuth::new(
            config.client_email.clone(),
            &config.private_key,
            config.token_uri.clone(),
            http_client.clone(),
        )?;

        Ok(Self {
            auth,
            spreadsheet_id: config.spreadsheet_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            value_input_option: config.value_input_option,
            http_client,
        })
    }

    /// Builds `…/v4/spreadsheets/{id}/values/{range}:append`.
    ///
    /// The range is pushed as a single path segment so sheet names with
    /// spaces or slashes are percent-encoded.
    pub fn append_url(&self, range: &str) -> Result<Url, SpreadsheetError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SpreadsheetError::Endpoint(format!("{}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| SpreadsheetError::Endpoint(self.api_base.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{range}:append"));
        url.query_pairs_mut()
            .append_pair("valueInputOption", self.value_input_option.as_str());
        Ok(url)
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    #[instrument(skip(self, row), fields(spreadsheet_id = %self.spreadsheet_id))]
    async fn append_row(&self, range: &str, row: &[String]) -> Result<(), SpreadsheetError> {
        let url = self.append_url(range)?;
        let token = self.auth.fetch_access_token().await?;

        debug!(columns = row.len(), "Sending append request to spreadsheet API");
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&token.access_token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network request to spreadsheet API failed");
                SpreadsheetError::Request(e)
            })?;

        if response.status().is_success() {
            info!("Row appended to spreadsheet");
            return Ok(());
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response body".to_string());
        error!(status = %status, error_body = %body, "Spreadsheet API returned error");
        Err(SpreadsheetError::Api { status, body })
    }
}
