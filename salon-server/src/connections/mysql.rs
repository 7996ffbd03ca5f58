//! MySQL-backed session opener

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};

use super::{BoxError, ConnectParams, Credentials, Role, SessionOpener};

/// Opens one dedicated `MySqlConnection` per user
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlOpener;

impl MySqlOpener {
    pub fn connect_options(params: &ConnectParams, credentials: &Credentials) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .database(&params.database)
            .username(credentials.username())
            .password(credentials.password())
            .charset("utf8mb4")
    }
}

#[async_trait]
impl SessionOpener for MySqlOpener {
    type Connection = MySqlConnection;

    async fn open(
        &self,
        params: &ConnectParams,
        credentials: &Credentials,
    ) -> Result<MySqlConnection, BoxError> {
        let conn = Self::connect_options(params, credentials).connect().await?;
        Ok(conn)
    }

    async fn activate_role(&self, conn: &mut MySqlConnection, role: Role) -> Result<(), BoxError> {
        // SET ROLE is not preparable; send it as a plain text query
        let statement = role.activation_statement();
        conn.execute(statement.as_str()).await?;
        Ok(())
    }

    async fn close(&self, conn: MySqlConnection) -> Result<(), BoxError> {
        conn.close().await?;
        Ok(())
    }
}

/// Role the server reports as active on a connection
pub async fn current_role(conn: &mut MySqlConnection) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>("SELECT CURRENT_ROLE()")
        .fetch_one(conn)
        .await
}
