//! # HTTP Request Handlers
//!
//! ## Available Handlers
//!
//! - **Health Check** (`health_check`) - Application liveness
//! - **Submit** (`submit`) - Course registration submission

mod health_check;
mod submit;

pub use health_check::*;
pub use submit::*;
