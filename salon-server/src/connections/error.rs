use shared::error::{AppError, ErrorCode};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by [`ConnectionRegistry::acquire`](super::ConnectionRegistry::acquire)
///
/// Teardown failures never show up here: eviction logs them and moves on.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("identity must not be empty")]
    EmptyIdentity,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("failed to connect with user credentials: {0}")]
    ConnectionFailure(#[source] BoxError),

    #[error("failed to set role {role}: {source}")]
    RoleActivationFailure {
        role: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Every acquire failure reaches the end user as a failed login; the cause
/// stays in the server log.
impl From<ConnectionError> for AppError {
    fn from(e: ConnectionError) -> Self {
        match &e {
            ConnectionError::EmptyIdentity | ConnectionError::InvalidRole(_) => {
                tracing::error!(error = %e, "Session acquire rejected by registry");
            }
            ConnectionError::ConnectionFailure(_)
            | ConnectionError::RoleActivationFailure { .. } => {
                tracing::warn!(error = %e, "Session acquire failed");
            }
        }
        AppError::new(ErrorCode::SessionEstablishFailed)
    }
}
