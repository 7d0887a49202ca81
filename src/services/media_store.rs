//! # Media Store Service
//!
//! Photo hosting behind the [`MediaStore`] trait. Handlers only ever see the
//! trait, so tests swap in a recording mock.
//!
//! ## Implementations
//!
//! - [`CloudinaryClient`] - Signed uploads and deletes against the Cloudinary REST API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use crate::config::CloudinaryConfig;
use crate::models::{PhotoUpload, UploadedPhoto};
use crate::utils::upload::to_data_uri;

/// Errors that can occur while talking to the media store
#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("refusing to upload an empty file")]
    EmptyFile,
    #[error("network request to media store failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("media store API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
    #[error("media store response is missing `{0}`")]
    MalformedResponse(&'static str),
}

/// Trait for hosted image storage
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads a photo under `folder` and returns its public reference.
    ///
    /// # Errors
    ///
    /// Returns [`MediaStoreError`] if the photo is empty, the request cannot
    /// be sent, or the store rejects it.
    async fn upload(
        &self,
        photo: &PhotoUpload,
        folder: &str,
    ) -> Result<UploadedPhoto, MediaStoreError>;

    /// Removes a previously uploaded photo.
    async fn delete(&self, public_id: &str) -> Result<(), MediaStoreError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: Option<String>,
}

/// Cloudinary-backed media store using signed API requests.
pub struct CloudinaryClient {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
    http_client: reqwest::Client,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig, http_client: reqwest::Client) -> Self {
        info!(
            cloud_name = %config.cloud_name,
            api_base = %config.api_base,
            "Initializing Cloudinary media store"
        );

        Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{action}", self.api_base, self.cloud_name)
    }

    /// Sends a signed form request and returns the successful response.
    async fn post_signed(
        &self,
        action: &str,
        signed: &[(&str, &str)],
        unsigned: &[(&str, &str)],
    ) -> Result<reqwest::Response, MediaStoreError> {
        let signature = sign_params(signed, &self.api_secret);

        let mut fields: Vec<(&str, &str)> = Vec::with_capacity(signed.len() + unsigned.len() + 3);
        fields.extend_from_slice(signed);
        fields.extend_from_slice(unsigned);
        fields.push(("api_key", self.api_key.as_str()));
        fields.push(("signature", signature.as_str()));
        fields.push(("signature_algorithm", "sha256"));

        let response = self
            .http_client
            .post(self.endpoint(action))
            .form(&fields)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network request to media store failed");
                MediaStoreError::Request(e)
            })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response body".to_string());
        error!(status = %status, error_body = %body, "Media store API returned error");
        Err(MediaStoreError::Api { status, body })
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    #[instrument(
        skip(self, photo),
        fields(size = photo.len(), content_type = %photo.content_type)
    )]
    async fn upload(
        &self,
        photo: &PhotoUpload,
        folder: &str,
    ) -> Result<UploadedPhoto, MediaStoreError> {
        if photo.is_empty() {
            warn!("Refusing to upload empty photo");
            return Err(MediaStoreError::EmptyFile);
        }

        let data_uri = to_data_uri(&photo.content_type, &photo.data);
        let timestamp = OffsetDateTime::now_utc().unix_timestamp().to_string();

        debug!("Sending upload request to media store");
        let response = self
            .post_signed(
                "upload",
                &[("folder", folder), ("timestamp", timestamp.as_str())],
                &[("file", data_uri.as_str())],
            )
            .await?;

        let body: UploadResponse = response.json().await?;
        let secure_url = body
            .secure_url
            .ok_or(MediaStoreError::MalformedResponse("secure_url"))?;
        let public_id = body
            .public_id
            .ok_or(MediaStoreError::MalformedResponse("public_id"))?;

        info!(public_id = %public_id, "Photo uploaded to media store");
        Ok(UploadedPhoto {
            secure_url,
            public_id,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> Result<(), MediaStoreError> {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp().to_string();

        let response = self
            .post_signed(
                "destroy",
                &[("public_id", public_id), ("timestamp", timestamp.as_str())],
                &[],
            )
            .await?;

        let body: DestroyResponse = response.json().await?;
        match body.result.as_deref() {
            Some("ok") => info!("Photo removed from media store"),
            other => warn!(result = ?other, "Media store did not confirm removal"),
        }
        Ok(())
    }
}

/// Computes the Cloudinary request signature.
///
/// Parameters are sorted by name, joined as `name=value` pairs with `&`, the
/// API secret is appended and the result is hashed with SHA-256.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_independent() {
        let a = sign_params(&[("timestamp", "1700000000"), ("folder", "f")], "secret");
        let b = sign_params(&[("folder", "f"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn signature_matches_known_digest() {
        // sha256("folder=course-registrations&timestamp=1700000000abcd")
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"folder=course-registrations&timestamp=1700000000abcd");
            format!("{:x}", hasher.finalize())
        };
        assert_eq!(
            sign_params(
                &[("timestamp", "1700000000"), ("folder", "course-registrations")],
                "abcd"
            ),
            expected
        );
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = CloudinaryClient::new(
            &CloudinaryConfig {
                cloud_name: "demo".into(),
                api_key: "key".into(),
                api_secret: "secret".into(),
                api_base: "https://api.cloudinary.com/".into(),
            },
            reqwest::Client::new(),
        );
        assert_eq!(
            client.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
