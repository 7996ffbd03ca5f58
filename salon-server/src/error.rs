//! Service-layer error
//!
//! Lets handlers use `?` on database calls, session acquisition and
//! business errors alike; everything ends up as an [`AppError`].

use axum::response::IntoResponse;
use shared::error::AppError;
use thiserror::Error;

use crate::connections::ConnectionError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Query on the service pool or a user session failed (logged, mapped to InternalError)
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    /// Per-user session could not be established (mapped to SessionEstablishFailed)
    #[error(transparent)]
    Session(#[from] ConnectionError),
    /// Already a client-facing error
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::internal()
            }
            ServiceError::Session(conn_err) => conn_err.into(),
            ServiceError::App(app_err) => app_err,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        AppError::from(self).into_response()
    }
}
