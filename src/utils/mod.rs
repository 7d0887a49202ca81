//! # Utility Modules
//!
//! This module contains utility functions and constants used throughout the
//! registration service.
//!
//! ## Available Utilities
//!
//! - **Constants** (`constant`) - Limits, defaults and response messages
//! - **Secrets** (`secret`) - Reading credentials from files or the environment
//! - **Upload** (`upload`) - Photo validation and data-URI encoding

pub mod constant;
pub mod secret;
pub mod upload;
