//! Helpers shared by the handlers

pub mod password;
pub mod validation;

pub use password::verify_password;
