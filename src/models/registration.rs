use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::utils::upload::{PHOTO_REQUIRED, PhotoValidator};

pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters.";
pub const EMAIL_INVALID: &str = "Please enter a valid email address.";
pub const COURSE_REQUIRED: &str = "Please select a course.";

/// Field names in the order the form presents them.
const FIELD_ORDER: [&str; 4] = ["name", "email", "course", "photo"];

/// Courses open for registration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Course {
    WebDevelopment,
    DataScience,
    MobileDevelopment,
    CloudComputing,
}

impl Course {
    pub const ALL: [Course; 4] = [
        Course::WebDevelopment,
        Course::DataScience,
        Course::MobileDevelopment,
        Course::CloudComputing,
    ];

    /// Identifier sent over the wire and written to the spreadsheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Course::WebDevelopment => "web-development",
            Course::DataScience => "data-science",
            Course::MobileDevelopment => "mobile-development",
            Course::CloudComputing => "cloud-computing",
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown course: {0}")]
pub struct UnknownCourse(pub String);

impl FromStr for Course {
    type Err = UnknownCourse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Course::ALL
            .into_iter()
            .find(|course| course.as_str() == s)
            .ok_or_else(|| UnknownCourse(s.to_string()))
    }
}

/// An uploaded photo as received from (or sent by) the form.
///
/// Serializes as metadata only, the bytes are never written out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    #[serde(skip)]
    pub data: Bytes,
}

impl PhotoUpload {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A validation failure on one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// The four editable registration fields, before validation.
///
/// The course is kept as the raw identifier so that an empty or unknown
/// selection can be reported like any other field error.
#[derive(Debug, Clone, Default, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "validate_course"))]
    pub course: String,
    #[validate(
        required(message = "Please upload a photo."),
        custom(function = "validate_photo")
    )]
    pub photo: Option<PhotoUpload>,
}

fn validate_course(course: &str) -> Result<(), ValidationError> {
    course
        .parse::<Course>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("course").with_message(Cow::Borrowed(COURSE_REQUIRED)))
}

fn validate_photo(photo: &PhotoUpload) -> Result<(), ValidationError> {
    PhotoValidator::validate_file_not_empty(&photo.data)
        .and_then(|_| PhotoValidator::validate_size(&photo.data))
        .and_then(|_| PhotoValidator::validate_content_type(&photo.content_type))
        .map_err(|msg| ValidationError::new("photo").with_message(Cow::Borrowed(msg)))
}

impl RegistrationForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        course: Course,
        photo: PhotoUpload,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            course: course.as_str().to_string(),
            photo: Some(photo),
        }
    }

    /// Clears every field back to its initial, empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Validates all fields and, on success, produces the submission.
    ///
    /// Errors are reported in form order, one per failing field.
    pub fn validate_submission(&self) -> Result<RegistrationSubmission, Vec<FieldError>> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            let collected = FIELD_ORDER
                .iter()
                .filter_map(|&field| {
                    let first = field_errors.get(field)?.first()?;
                    Some(FieldError {
                        field,
                        message: first
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| default_message(field).to_string()),
                    })
                })
                .collect();
            return Err(collected);
        }

        Ok(RegistrationSubmission {
            name: self.name.clone(),
            email: self.email.clone(),
            course: self.course.clone(),
            photo: self.photo.clone().unwrap_or_else(|| PhotoUpload::new("", Bytes::new())),
        })
    }

    /// Produces a submission without checking anything.
    ///
    /// A missing photo becomes an empty blob.
    pub fn into_unchecked_submission(self) -> RegistrationSubmission {
        RegistrationSubmission {
            name: self.name,
            email: self.email,
            course: self.course,
            photo: self
                .photo
                .unwrap_or_else(|| PhotoUpload::new("application/octet-stream", Bytes::new())),
        }
    }
}

fn default_message(field: &str) -> &'static str {
    match field {
        "name" => NAME_TOO_SHORT,
        "email" => EMAIL_INVALID,
        "course" => COURSE_REQUIRED,
        _ => PHOTO_REQUIRED,
    }
}

/// A registration ready to be recorded.
#[derive(Debug, Clone)]
pub struct RegistrationSubmission {
    pub name: String,
    pub email: String,
    pub course: String,
    pub photo: PhotoUpload,
}

impl RegistrationSubmission {
    /// The spreadsheet row for this submission, in column order.
    pub fn to_row(&self, photo_url: &str) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.course.clone(),
            photo_url.to_string(),
        ]
    }
}

/// Reference to a photo stored by the media store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedPhoto {
    pub secure_url: String,
    pub public_id: String,
}

/// The record as written to the spreadsheet, echoed back on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub name: String,
    pub email: String,
    pub course: String,
    pub photo_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constant::MAX_PHOTO_SIZE;
    use crate::utils::upload::{PHOTO_TOO_LARGE, PHOTO_UNSUPPORTED_TYPE};

    fn jpeg() -> PhotoUpload {
        PhotoUpload::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]).with_file_name("me.jpg")
    }

    fn valid_form() -> RegistrationForm {
        RegistrationForm::new("Jane Doe", "jane@example.com", Course::WebDevelopment, jpeg())
    }

    fn messages(errors: &[FieldError]) -> Vec<(&'static str, &str)> {
        errors.iter().map(|e| (e.field, e.message.as_str())).collect()
    }

    #[test]
    fn course_identifiers_round_trip() {
        for course in Course::ALL {
            assert_eq!(course.as_str().parse::<Course>(), Ok(course));
            let json = serde_json::to_string(&course).unwrap();
            assert_eq!(json, format!("\"{}\"", course.as_str()));
        }
        assert!("underwater-basket-weaving".parse::<Course>().is_err());
    }

    #[test]
    fn valid_form_produces_submission() {
        let submission = valid_form().validate_submission().unwrap();
        assert_eq!(submission.course, "web-development");
        assert_eq!(
            submission.to_row("https://cdn/x.jpg"),
            vec!["Jane Doe", "jane@example.com", "web-development", "https://cdn/x.jpg"]
        );
    }

    #[test]
    fn one_character_name_is_rejected() {
        let mut form = valid_form();
        form.name = "J".into();
        let errors = form.validate_submission().unwrap_err();
        assert_eq!(messages(&errors), vec![("name", NAME_TOO_SHORT)]);
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let mut form = valid_form();
        form.name = "李".into();
        assert!(form.validate_submission().is_err());
        form.name = "李雷".into();
        assert!(form.validate_submission().is_ok());
    }

    #[test]
    fn empty_form_reports_every_field_in_order() {
        let errors = RegistrationForm::default().validate_submission().unwrap_err();
        assert_eq!(
            messages(&errors),
            vec![
                ("name", NAME_TOO_SHORT),
                ("email", EMAIL_INVALID),
                ("course", COURSE_REQUIRED),
                ("photo", PHOTO_REQUIRED),
            ]
        );
    }

    #[test]
    fn oversized_photo_is_rejected() {
        let mut form = valid_form();
        form.photo = Some(PhotoUpload::new("image/png", vec![0u8; MAX_PHOTO_SIZE + 1]));
        let errors = form.validate_submission().unwrap_err();
        assert_eq!(messages(&errors), vec![("photo", PHOTO_TOO_LARGE)]);
    }

    #[test]
    fn unsupported_photo_type_is_rejected() {
        let mut form = valid_form();
        form.photo = Some(PhotoUpload::new("image/gif", b"GIF89a".to_vec()));
        let errors = form.validate_submission().unwrap_err();
        assert_eq!(messages(&errors), vec![("photo", PHOTO_UNSUPPORTED_TYPE)]);
    }

    #[test]
    fn reset_clears_all_fields() {
        let mut form = valid_form();
        form.reset();
        assert!(form.name.is_empty());
        assert!(form.email.is_empty());
        assert!(form.course.is_empty());
        assert!(form.photo.is_none());
    }

    #[test]
    fn unchecked_submission_fills_missing_photo_with_empty_blob() {
        let form = RegistrationForm {
            name: "Jane Doe".into(),
            ..Default::default()
        };
        let submission = form.into_unchecked_submission();
        assert!(submission.photo.is_empty());
        assert_eq!(submission.name, "Jane Doe");
    }

    #[test]
    fn record_serializes_photo_url_in_camel_case() {
        let record = RegistrationRecord {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            course: "web-development".into(),
            photo_url: "https://cdn/x.jpg".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["photoUrl"], "https://cdn/x.jpg");
    }
}
