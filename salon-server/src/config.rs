//! Salon server configuration

use crate::connections::ConnectParams;
use sqlx::mysql::MySqlConnectOptions;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Salon server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// MySQL host shared by the admin pool and per-user sessions
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    /// Service account behind the admin pool
    pub db_user: String,
    pub db_password: String,
    /// HTTP bind address
    pub server_host: String,
    pub server_port: u16,
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    /// Built-in administrator; never gets a per-user session
    pub admin_email: String,
    pub admin_password: String,
    /// Allowed CORS origin
    pub frontend_url: String,
    /// Environment: development | staging | production
    pub environment: String,
    /// Emit JSON log lines (env: LOG_FORMAT=json)
    pub log_json: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str, dev_default: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                dev_default.to_string()
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn var_or(name: &str, default: &str) -> String {
        std::env::var(name)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => v
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {v}").into()),
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = Self::var_or("ENVIRONMENT", "development");

        Ok(Self {
            db_host: Self::var_or("DB_HOST", "localhost"),
            db_port: Self::parsed_or("DB_PORT", 3306)?,
            db_name: Self::var_or("DB_NAME", "salondb"),
            db_user: Self::var_or("DB_USER", "salon_user"),
            db_password: Self::require_secret("DB_PASSWORD", &environment, "salon_password_456")?,
            server_host: Self::var_or("SERVER_HOST", "0.0.0.0"),
            server_port: Self::parsed_or("SERVER_PORT", 8080)?,
            jwt_secret: Self::require_secret(
                "JWT_SECRET",
                &environment,
                "dev-JWT_SECRET-not-for-production",
            )?,
            jwt_expires_hours: Self::parsed_or("JWT_EXPIRES_HOURS", 24)?,
            admin_email: Self::var_or("ADMIN_EMAIL", "admin@bebacoiffure.com"),
            admin_password: Self::require_secret("ADMIN_PASSWORD", &environment, "admin123")?,
            frontend_url: Self::var_or("FRONTEND_URL", "http://localhost:5173"),
            log_json: Self::var_or("LOG_FORMAT", "text") == "json",
            environment,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Target of per-user sessions
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams::new(&self.db_host, self.db_port, &self.db_name)
    }

    /// Connect options of the service account
    pub fn admin_connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user)
            .password(&self.db_password)
            .charset("utf8mb4")
    }

    pub fn is_admin_identity(&self, identity: &str) -> bool {
        identity == self.admin_email
    }
}
