//! # Service-Account Authentication
//!
//! Google APIs accept a short-lived OAuth2 access token obtained by trading a
//! self-signed JWT (the "assertion") at the token endpoint. This module
//! builds and signs that assertion with the service account's RSA key and
//! performs the exchange.
//!
//! Tokens are not cached: every call to [`ServiceAccountAuth::fetch_access_token`]
//! performs a fresh exchange, keeping each request independent.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, instrument, trace};

use crate::utils::constant::{ASSERTION_LIFETIME_SECS, SPREADSHEETS_SCOPE};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Errors that can occur while obtaining an access token
#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("invalid service-account private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint returned error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

/// Claims of the self-signed assertion
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AssertionClaims {
    /// Service account email
    pub iss: String,
    /// Space separated OAuth2 scopes
    pub scope: String,
    /// Token endpoint the assertion is meant for
    pub aud: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Exchanges service-account credentials for spreadsheet access tokens.
pub struct ServiceAccountAuth {
    client_email: String,
    token_uri: String,
    encoding_key: EncodingKey,
    http_client: reqwest::Client,
}

impl ServiceAccountAuth {
    /// Parses the private key and prepares the authenticator.
    ///
    /// # Errors
    ///
    /// Returns [`GoogleAuthError::InvalidKey`] if `private_key_pem` is not a
    /// PEM encoded RSA key.
    pub fn new(
        client_email: impl Into<String>,
        private_key_pem: &str,
        token_uri: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Result<Self, GoogleAuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(GoogleAuthError::InvalidKey)?;

        Ok(Self {
            client_email: client_email.into(),
            token_uri: token_uri.into(),
            encoding_key,
            http_client,
        })
    }

    /// Builds the claims for an assertion issued at `now`.
    pub fn claims(&self, now: i64) -> AssertionClaims {
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Signs an RS256 assertion issued at `now`.
    pub fn create_assertion(&self, now: i64) -> Result<String, GoogleAuthError> {
        let claims = self.claims(now);
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(GoogleAuthError::Signing)?;
        trace!("Assertion signed");
        Ok(assertion)
    }

    /// Trades a freshly signed assertion for an access token.
    ///
    /// # Errors
    ///
    /// - [`GoogleAuthError::Signing`] - The assertion could not be signed
    /// - [`GoogleAuthError::Request`] - Network failure or unparsable response
    /// - [`GoogleAuthError::Api`] - The token endpoint rejected the assertion
    #[instrument(skip(self), fields(client_email = %self.client_email))]
    pub async fn fetch_access_token(&self) -> Result<AccessToken, GoogleAuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let assertion = self.create_assertion(now)?;

        debug!(token_uri = %self.token_uri, "Requesting access token");
        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network request to token endpoint failed");
                GoogleAuthError::Request(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response body".to_string());
            error!(status = %status, error_body = %body, "Token endpoint returned error");
            return Err(GoogleAuthError::Api { status, body });
        }

        let token: AccessToken = response.json().await?;
        debug!(expires_in = ?token.expires_in, "Access token obtained");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    use super::*;

    const PRIVATE_KEY: &str = include_str!("../../tests/data/service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/data/service_account_pub.pem");
    const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

    fn auth() -> ServiceAccountAuth {
        ServiceAccountAuth::new(
            "svc@project.iam.gserviceaccount.com",
            PRIVATE_KEY,
            TOKEN_URI,
            reqwest::Client::new(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_garbage_key() {
        let result = ServiceAccountAuth::new(
            "svc@project.iam.gserviceaccount.com",
            "not a key",
            TOKEN_URI,
            reqwest::Client::new(),
        );
        assert!(matches!(result, Err(GoogleAuthError::InvalidKey(_))));
    }

    #[test]
    fn claims_cover_one_hour_for_spreadsheet_scope() {
        let claims = auth().claims(1_700_000_000);
        assert_eq!(claims.iss, "svc@project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SPREADSHEETS_SCOPE);
        assert_eq!(claims.aud, TOKEN_URI);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn assertion_verifies_with_public_key() {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let assertion = auth().create_assertion(now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TOKEN_URI]);
        let decoded = decode::<AssertionClaims>(
            &assertion,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.alg, Algorithm::RS256);
        assert_eq!(decoded.claims, auth().claims(now));
    }
}
