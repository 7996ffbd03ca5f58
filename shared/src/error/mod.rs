//! Unified error system
//!
//! - [`ErrorCode`]: numeric codes grouped by range
//! - [`ErrorCategory`]: range classification, drives error logging
//! - [`AppError`]: what handlers return
//! - [`ApiResponse`]: the JSON envelope of every response
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::SessionEstablishFailed);
//! assert_eq!(err.http_status(), http::StatusCode::UNAUTHORIZED);
//! let body = ApiResponse::<()>::from(err);
//! assert_eq!(body.code, 3001);
//! ```

mod category;
mod codes;
mod http;
mod response;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use response::ApiResponse;
pub use types::{AppError, AppResult};
