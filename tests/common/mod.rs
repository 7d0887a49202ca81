#![allow(dead_code)]

use std::sync::{
    Arc, Mutex, Once,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use course_registration::{
    config::SubmissionConfig,
    models::{PhotoUpload, UploadedPhoto},
    services::{
        media_store::{MediaStore, MediaStoreError},
        spreadsheet::{SpreadsheetError, SpreadsheetService},
    },
};
use reqwest::{StatusCode, multipart};
use tokio::net::TcpListener;

pub fn init_tracing_once() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("course_registration=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub folder: String,
    pub content_type: String,
    pub file_name: Option<String>,
    pub size: usize,
}

/// A media store that records every call instead of uploading anything.
#[derive(Debug, Default)]
pub struct MockMediaStore {
    uploads: Mutex<Vec<RecordedUpload>>,
    deletes: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    upload_delay: Mutex<Option<Duration>>,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent upload fail
    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    /// Delays every subsequent upload
    pub fn delay_uploads(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

pub const MOCK_PHOTO_URL: &str =
    "https://res.cloudinary.com/demo/image/upload/v1/course-registrations/photo.jpg";
pub const MOCK_PUBLIC_ID: &str = "course-registrations/photo";

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(
        &self,
        photo: &PhotoUpload,
        folder: &str,
    ) -> Result<UploadedPhoto, MediaStoreError> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            folder: folder.to_string(),
            content_type: photo.content_type.clone(),
            file_name: photo.file_name.clone(),
            size: photo.len(),
        });

        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if photo.is_empty() {
            return Err(MediaStoreError::EmptyFile);
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaStoreError::Api {
                status: StatusCode::BAD_REQUEST,
                body: r#"{"error":{"message":"Invalid image file"}}"#.to_string(),
            });
        }

        Ok(UploadedPhoto {
            secure_url: MOCK_PHOTO_URL.to_string(),
            public_id: MOCK_PUBLIC_ID.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaStoreError> {
        self.deletes.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAppend {
    pub range: String,
    pub row: Vec<String>,
}

/// A spreadsheet that records appended rows.
#[derive(Debug, Default)]
pub struct MockSpreadsheet {
    appends: Mutex<Vec<RecordedAppend>>,
    fail_appends: AtomicBool,
}

impl MockSpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent append fail
    pub fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    pub fn appends(&self) -> Vec<RecordedAppend> {
        self.appends.lock().unwrap().clone()
    }

    pub fn append_count(&self) -> usize {
        self.appends.lock().unwrap().len()
    }
}

#[async_trait]
impl SpreadsheetService for MockSpreadsheet {
    async fn append_row(&self, range: &str, row: &[String]) -> Result<(), SpreadsheetError> {
        self.appends.lock().unwrap().push(RecordedAppend {
            range: range.to_string(),
            row: row.to_vec(),
        });

        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(SpreadsheetError::Api {
                status: StatusCode::FORBIDDEN,
                body: "The caller does not have permission".to_string(),
            });
        }
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub media_store: Arc<MockMediaStore>,
    pub spreadsheet: Arc<MockSpreadsheet>,
}

/// Spawns the application with the default (strict) submission behaviour.
///
/// Returned address format: `http://127.0.0.1:8492`
pub async fn spawn_app() -> TestApp {
    spawn_app_with(SubmissionConfig::default()).await
}

/// Spawns the application with mock services and the given behaviour.
pub async fn spawn_app_with(submission: SubmissionConfig) -> TestApp {
    init_tracing_once();

    let media_store = Arc::new(MockMediaStore::new());
    let spreadsheet = Arc::new(MockSpreadsheet::new());

    // Randomly choose an available port
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port at localhost");
    let port = listener.local_addr().unwrap().port();

    let app = course_registration::app_with_services(
        media_store.clone(),
        spreadsheet.clone(),
        submission,
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let address = format!("http://127.0.0.1:{port}");

    // Wait for server to be ready
    let client = reqwest::Client::new();
    for _ in 0..10 {
        if client
            .get(format!("{address}/health-check"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    TestApp {
        address,
        media_store,
        spreadsheet,
    }
}

/// Creates JPEG-looking bytes of the given size.
///
/// Only the magic number is real, which is all the format sniffing looks at.
pub fn create_test_jpeg(size: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    data.resize(size.max(data.len()), 0);
    data
}

/// Multipart form for Jane Doe's registration without the photo part.
pub fn jane_doe_text_fields() -> multipart::Form {
    multipart::Form::new()
        .text("name", "Jane Doe")
        .text("email", "jane@example.com")
        .text("course", "web-development")
}

pub fn photo_part(data: Vec<u8>, mime: &str, file_name: &str) -> multipart::Part {
    multipart::Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}

/// Jane Doe's complete registration with a 2 KB JPEG.
pub fn jane_doe_form() -> multipart::Form {
    jane_doe_text_fields().part("photo", photo_part(create_test_jpeg(2048), "image/jpeg", "jane.jpg"))
}

pub async fn submit(address: &str, form: multipart::Form) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{address}/api/submit"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send submission")
}
