//! Account lookup (`USUARIO_SISTEMA`)

use sqlx::FromRow;
use sqlx::mysql::MySqlPool;

use crate::connections::Role;

/// Row returned by the `BuscarUsuario` procedure
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub usu_id: u32,
    /// Login name; salon accounts use their email
    pub usu_nombre_usuario: String,
    pub usu_contrasena: String,
    pub usu_rol: String,
    pub emp_id: Option<u32>,
    pub cli_id: Option<u32>,
}

impl UserAccount {
    /// Canonical role of the stored `usu_rol`, `None` when unknown
    pub fn role(&self) -> Option<Role> {
        Role::from_stored(&self.usu_rol)
    }

    /// ID of the profile record behind the account for `role`
    ///
    /// Employees are keyed by `emp_id`, clients by `cli_id`. Admin accounts
    /// have no profile table and use the account ID. `None` when the
    /// account is missing the profile it needs.
    pub fn profile_id(&self, role: Role) -> Option<u32> {
        match role {
            Role::Employee => self.emp_id,
            Role::Client => self.cli_id,
            Role::Admin => Some(self.usu_id),
        }
    }
}

/// Look an account up by login name
pub async fn find_by_username(
    pool: &MySqlPool,
    username: &str,
) -> Result<Option<UserAccount>, sqlx::Error> {
    sqlx::query_as::<_, UserAccount>("CALL BuscarUsuario(?)")
        .bind(username)
        .fetch_optional(pool)
        .await
}
