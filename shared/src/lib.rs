//! Shared types for the salon backend
//!
//! Common types used across crates: the unified error system, the
//! request/response DTOs of the auth surface and small utilities.

pub mod client;
pub mod error;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
