//! Numeric error codes
//!
//! | Range | Category |
//! |-------|----------|
//! | 0xxx | general |
//! | 1xxx | authentication |
//! | 2xxx | permission |
//! | 3xxx | per-user database session |
//! | 9xxx | system |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried by every API error
///
/// Serialized as a plain `u16` so the frontend can switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    Unknown = 1,
    /// Request body failed field validation
    ValidationFailed = 2,
    /// Request body could not be read at all
    InvalidRequest = 5,

    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    /// The database session behind a token is gone (logged out or taken over)
    SessionExpired = 1005,
    /// Account has a role the service does not know
    InvalidUserRole = 1008,

    AdminRequired = 2003,

    /// Opening or role-scoping the per-user database session failed
    SessionEstablishFailed = 3001,

    InternalError = 9001,
}

impl ErrorCode {
    const ALL: [ErrorCode; 13] = [
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::InvalidRequest,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenExpired,
        ErrorCode::TokenInvalid,
        ErrorCode::SessionExpired,
        ErrorCode::InvalidUserRole,
        ErrorCode::AdminRequired,
        ErrorCode::SessionEstablishFailed,
        ErrorCode::InternalError,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default end-user message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::NotAuthenticated => "Authorization header required",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::SessionExpired => "Session has ended, please login again",
            ErrorCode::InvalidUserRole => "Invalid user role",
            ErrorCode::AdminRequired => "Admin access required",
            ErrorCode::SessionEstablishFailed => "Failed to establish user session",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A number that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
