//! # Upload Utilities
//!
//! This module provides the photo checks shared by the submission handler and
//! the form client, plus the data-URI encoding the media store expects.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use tracing::trace;

use crate::utils::constant::{ACCEPTED_IMAGE_TYPES, MAX_PHOTO_SIZE};

pub const PHOTO_REQUIRED: &str = "Please upload a photo.";
pub const PHOTO_TOO_LARGE: &str = "Photo must be less than 5MB.";
pub const PHOTO_UNSUPPORTED_TYPE: &str = "Only .jpg, .jpeg, .png and .webp formats are supported.";
pub const PHOTO_CONTENT_MISMATCH: &str = "Photo content does not match its file type.";

/// Provides photo validation utilities for the registration form.
pub struct PhotoValidator;

impl PhotoValidator {
    /// Validates that the declared content type is one of
    /// [`ACCEPTED_IMAGE_TYPES`].
    ///
    /// The comparison ignores ASCII case, since browsers are not consistent
    /// about it.
    pub fn validate_content_type(content_type: &str) -> Result<(), &'static str> {
        let content_type = content_type.trim();
        if ACCEPTED_IMAGE_TYPES
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(content_type))
        {
            Ok(())
        } else {
            Err(PHOTO_UNSUPPORTED_TYPE)
        }
    }

    /// Validates that the photo is no larger than [`MAX_PHOTO_SIZE`].
    pub fn validate_size(data: &[u8]) -> Result<(), &'static str> {
        if data.len() > MAX_PHOTO_SIZE {
            return Err(PHOTO_TOO_LARGE);
        }
        Ok(())
    }

    /// Validates that the file is not empty.
    pub fn validate_file_not_empty(data: &[u8]) -> Result<(), &'static str> {
        if data.is_empty() {
            return Err(PHOTO_REQUIRED);
        }
        Ok(())
    }

    /// Sniffs the image bytes and checks them against the declared content
    /// type.
    ///
    /// Only JPEG, PNG and WebP are accepted, and the sniffed format must be
    /// the one the content type names, since the content type ends up in the
    /// data URI sent to the media store.
    pub fn validate_image_format(
        content_type: &str,
        data: &[u8],
    ) -> Result<ImageFormat, &'static str> {
        let image_format = image::guess_format(data).map_err(|_| PHOTO_UNSUPPORTED_TYPE)?;

        let declared = content_type.trim().to_ascii_lowercase();
        let matches = match image_format {
            ImageFormat::Jpeg => declared == "image/jpeg" || declared == "image/jpg",
            ImageFormat::Png => declared == "image/png",
            ImageFormat::WebP => declared == "image/webp",
            _ => return Err(PHOTO_UNSUPPORTED_TYPE),
        };
        if !matches {
            return Err(PHOTO_CONTENT_MISMATCH);
        }

        trace!(format = ?image_format, "Image format validated");
        Ok(image_format)
    }
}

/// Encodes a blob as `data:<content_type>;base64,<payload>`.
pub fn to_data_uri(content_type: &str, data: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(data))
}
