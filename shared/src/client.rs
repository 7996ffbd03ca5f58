//! Client-related types shared between server and frontend
//!
//! Request/response types of the auth surface and the connection
//! diagnostics endpoint.

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userType")]
    pub user_type: String,
    pub user: UserInfo,
}

/// User information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub email: String,
    pub role: String,
}

/// Current user response
///
/// `db_role` is what the database reports as active on the caller's own
/// session; `None` for the admin, who runs on the service pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub id: u64,
    pub email: String,
    pub user_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_role: Option<String>,
}

// =============================================================================
// Connection diagnostics DTOs
// =============================================================================

/// One live per-user database session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub user: String,
    pub role: String,
    /// Connect time, `YYYY-MM-DD HH:MM:SS` (UTC)
    pub connected: String,
    /// Elapsed time since connect, human readable
    pub duration: String,
}

/// Payload of the connections status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsInfo {
    pub total_count: usize,
    pub connections: Vec<ConnectionInfo>,
}
