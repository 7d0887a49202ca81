mod registration;
mod state;

pub use registration::{
    COURSE_REQUIRED, Course, EMAIL_INVALID, FieldError, NAME_TOO_SHORT, PhotoUpload,
    RegistrationForm, RegistrationRecord, RegistrationSubmission, UnknownCourse, UploadedPhoto,
};
pub use state::AppState;
