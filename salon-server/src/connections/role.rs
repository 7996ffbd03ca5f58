use std::fmt;
use std::str::FromStr;

use super::ConnectionError;

/// Database permission set activated on a per-user session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Employee,
    Client,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Employee, Role::Client];

    /// Canonical label (`admin`, `employee`, `client`)
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Client => "client",
        }
    }

    /// Name of the database role granted to salon accounts
    pub const fn db_role(&self) -> &'static str {
        match self {
            Self::Admin => "rol_admin",
            Self::Employee => "rol_empleado",
            Self::Client => "rol_cliente",
        }
    }

    /// Statement that activates this role on a MySQL connection
    pub fn activation_statement(&self) -> String {
        format!("SET ROLE '{}'@'%'", self.db_role())
    }

    /// Translate the value stored in the accounts table (`usu_rol`)
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "empleado" | "employee" => Some(Self::Employee),
            "cliente" | "client" => Some(Self::Client),
            _ => None,
        }
    }
}

impl FromStr for Role {
    type Err = ConnectionError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.label() == label)
            .ok_or_else(|| ConnectionError::InvalidRole(label.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_labels() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!("client".parse::<Role>().unwrap(), Role::Client);
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        for label in ["superuser", "Admin", "empleado", ""] {
            match label.parse::<Role>() {
                Err(ConnectionError::InvalidRole(l)) => assert_eq!(l, label),
                other => panic!("expected InvalidRole for {label:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_db_role_mapping() {
        assert_eq!(Role::Admin.db_role(), "rol_admin");
        assert_eq!(Role::Employee.db_role(), "rol_empleado");
        assert_eq!(Role::Client.db_role(), "rol_cliente");
        assert_eq!(
            Role::Client.activation_statement(),
            "SET ROLE 'rol_cliente'@'%'"
        );
    }

    #[test]
    fn test_from_stored() {
        assert_eq!(Role::from_stored("empleado"), Some(Role::Employee));
        assert_eq!(Role::from_stored("cliente"), Some(Role::Client));
        assert_eq!(Role::from_stored("proveedor"), None);
    }
}
