//! Supported database dialects.

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Catalog dialect, resolved once per run from the connection's driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// MySQL and MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
}

impl Dialect {
    /// Resolve a configured driver name to a dialect.
    ///
    /// Accepts the common spellings used in framework configs
    /// ("mysql", "mariadb", "pgsql", "postgres", "postgresql").
    pub fn from_driver(driver: &str) -> Result<Self> {
        match driver.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::Mysql),
            "pgsql" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(GenError::UnsupportedDialect(other.to_string())),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Mysql => write!(f, "mysql"),
            Dialect::Postgres => write!(f, "pgsql"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_spellings() {
        assert_eq!(Dialect::from_driver("mysql").unwrap(), Dialect::Mysql);
        assert_eq!(Dialect::from_driver("mariadb").unwrap(), Dialect::Mysql);
        assert_eq!(Dialect::from_driver("pgsql").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_driver("PostgreSQL").unwrap(), Dialect::Postgres);
    }

    #[test]
    fn test_unsupported_driver() {
        let err = Dialect::from_driver("sqlite").unwrap_err();
        assert!(matches!(err, GenError::UnsupportedDialect(_)));
    }
}
