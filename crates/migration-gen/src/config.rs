//! Configuration loading for connections and generator behavior.
//!
//! The connection to use is resolved explicitly from the named connection
//! map - there is no process-wide default connection singleton. The caller
//! passes the resolved connection (and its dialect) down the pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{GenError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection name used when the command does not name one.
    pub default_connection: String,

    /// Named database connections.
    pub connections: HashMap<String, ConnectionConfig>,

    /// Generator behavior configuration.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GenError::Config(format!("cannot read config file {:?}: {}", path, e))
        })?;
        let config: Config = serde_yaml::from_str(&text)
            .map_err(|e| GenError::Config(format!("invalid config file {:?}: {}", path, e)))?;

        if config.connections.is_empty() {
            return Err(GenError::Config("no connections defined".to_string()));
        }

        Ok(config)
    }

    /// Resolve a connection by name, falling back to the default.
    pub fn resolve_connection<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a ConnectionConfig)> {
        let name = name.unwrap_or(&self.default_connection);
        let conn = self.connections.get(name).ok_or_else(|| {
            GenError::Config(format!("unknown connection '{}' (defined: {})", name, {
                let mut names: Vec<_> = self.connections.keys().cloned().collect();
                names.sort();
                names.join(", ")
            }))
        })?;
        Ok((name, conn))
    }
}

/// One database connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Driver name ("mysql", "mariadb", "pgsql", "postgres").
    pub driver: String,

    /// Database host.
    pub host: String,

    /// Database port. Defaults per driver (3306 / 5432) when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Schema to introspect for PostgreSQL (default: "public").
    /// Ignored by MySQL, which introspects the connected database.
    #[serde(default = "default_public_schema")]
    pub schema: String,
}

impl ConnectionConfig {
    /// The dialect this connection speaks.
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_driver(&self.driver)
    }

    /// Effective port, with per-driver defaults.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(match Dialect::from_driver(&self.driver) {
            Ok(Dialect::Postgres) => 5432,
            _ => 3306,
        })
    }
}

/// Generator behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Directory migration files are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Path to a user-edited template. The embedded stub is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Tables never generated for. Always contains the framework's own
    /// migration bookkeeping table.
    #[serde(default = "default_exclude_tables")]
    pub exclude_tables: Vec<String>,

    /// Bounded parallelism for per-table generation.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            template: None,
            exclude_tables: default_exclude_tables(),
            workers: default_workers(),
        }
    }
}

fn default_public_schema() -> String {
    "public".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("database/migrations")
}

fn default_exclude_tables() -> Vec<String> {
    vec!["migrations".to_string()]
}

fn default_workers() -> usize {
    4
}
