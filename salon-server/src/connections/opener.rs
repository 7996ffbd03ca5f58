use async_trait::async_trait;
use std::fmt;

use super::{BoxError, Role};

/// Where per-user sessions connect to, fixed at registry construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectParams {
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
        }
    }
}

/// A user's own database login
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Database side of the registry
///
/// Opens a connection with a user's credentials, switches the active role on
/// it, and tears it down again. The registry never touches the connection
/// type beyond handing it back to these methods.
#[async_trait]
pub trait SessionOpener: Send + Sync + 'static {
    type Connection: Send + 'static;

    async fn open(
        &self,
        params: &ConnectParams,
        credentials: &Credentials,
    ) -> Result<Self::Connection, BoxError>;

    async fn activate_role(&self, conn: &mut Self::Connection, role: Role)
    -> Result<(), BoxError>;

    async fn close(&self, conn: Self::Connection) -> Result<(), BoxError>;
}
