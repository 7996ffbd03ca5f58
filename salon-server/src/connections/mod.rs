//! Per-user database sessions
//!
//! Every logged-in salon user gets a dedicated database connection opened
//! with their own credentials and restricted by the database role that
//! matches their account type. [`ConnectionRegistry`] owns those sessions;
//! the database side is abstracted behind [`SessionOpener`] with
//! [`MySqlOpener`] as the production implementation.

mod error;
mod mysql;
mod opener;
mod registry;
mod role;
mod session;

pub use error::{BoxError, ConnectionError};
pub use mysql::{MySqlOpener, current_role};
pub use opener::{ConnectParams, Credentials, SessionOpener};
pub use registry::ConnectionRegistry;
pub use role::Role;
pub use session::{Session, SessionInfo};
