//! # Business Logic Services
//!
//! This module contains the services behind the submission endpoint. The two
//! external SaaS dependencies sit behind traits so handlers and tests never
//! depend on a concrete provider.
//!
//! ## Available Services
//!
//! - **Media store** (`media_store`) - Photo hosting, Cloudinary implementation
//! - **Google auth** (`google_auth`) - Service-account token exchange
//! - **Spreadsheet** (`spreadsheet`) - Row storage, Google Sheets implementation
//! - **Registration** (`registration`) - Upload, append and compensation sequence

pub mod google_auth;
pub mod media_store;
pub mod registration;
pub mod spreadsheet;
