//! Authentication
//!
//! - [`JwtService`] - token issue/validation
//! - [`CurrentUser`] - authenticated caller (also an axum extractor)
//! - [`require_auth`] / [`require_admin`] - route middleware

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
