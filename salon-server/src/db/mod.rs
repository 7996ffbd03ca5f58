//! Database access through the service's own admin pool

pub mod users;

use sqlx::Executor;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::Config;
use crate::connections::Role;

const ADMIN_POOL_MAX_CONNECTIONS: u32 = 10;

/// Open the admin pool; every pooled connection runs with `rol_admin` active
pub async fn connect_admin_pool(config: &Config) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(ADMIN_POOL_MAX_CONNECTIONS)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                let statement = Role::Admin.activation_statement();
                conn.execute(statement.as_str()).await?;
                Ok(())
            })
        })
        .connect_with(config.admin_connect_options())
        .await?;

    tracing::info!(
        host = %config.db_host,
        database = %config.db_name,
        user = %config.db_user,
        "Admin database pool connected"
    );
    Ok(pool)
}
