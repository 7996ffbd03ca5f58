//! Application state

use sqlx::mysql::MySqlPool;
use std::sync::Arc;

use crate::auth::JwtService;
use crate::config::Config;
use crate::connections::{ConnectionRegistry, MySqlOpener};

pub type UserRegistry = ConnectionRegistry<MySqlOpener>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Service account pool (`rol_admin`), used for account lookup
    pub pool: MySqlPool,
    /// Per-user database sessions
    pub registry: Arc<UserRegistry>,
    pub jwt: JwtService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, pool: MySqlPool) -> Self {
        let registry = ConnectionRegistry::new(config.connect_params(), MySqlOpener);
        Self {
            pool,
            registry: Arc::new(registry),
            jwt: JwtService::new(&config.jwt_secret, config.jwt_expires_hours),
            config: Arc::new(config),
        }
    }
}
