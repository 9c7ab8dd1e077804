//! Dialect catalog readers.
//!
//! Each supported dialect implements [`CatalogReader`] and returns uniform
//! [`RawColumn`] rows, so the schema normalizer never branches on dialect.
//! All introspection queries are read-only and parameterized with binds.

mod mysql;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::Result;

pub use mysql::MysqlCatalog;
pub use postgres::PostgresCatalog;

/// One column as reported by the dialect's catalog, before normalization.
#[derive(Debug, Clone)]
pub struct RawColumn {
    /// Column name.
    pub name: String,

    /// Native type spelling. For MySQL this is the full `COLUMN_TYPE`
    /// (e.g. `bigint(20) unsigned`); for PostgreSQL the canonical
    /// `data_type` (e.g. `character varying`).
    pub raw_type: String,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Raw default expression, if declared.
    pub default_value: Option<String>,
}

/// Read-only schema introspection against a connected database.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// The dialect this reader speaks.
    fn dialect(&self) -> Dialect;

    /// All user tables visible to the connection, in catalog order.
    ///
    /// An empty result is not an error at this level; the orchestrator
    /// decides whether an empty catalog aborts the run.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of one table, in ordinal position order.
    async fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>>;

    /// Primary key column names in key order.
    ///
    /// Returns an empty vec (not an error) for a table with no declared
    /// primary key.
    async fn list_primary_key_columns(&self, table: &str) -> Result<Vec<String>>;
}

/// Connect a catalog reader for the configured connection.
pub async fn connect(config: &ConnectionConfig, max_conns: usize) -> Result<Arc<dyn CatalogReader>> {
    match config.dialect()? {
        Dialect::Mysql => Ok(Arc::new(MysqlCatalog::connect(config, max_conns).await?)),
        Dialect::Postgres => Ok(Arc::new(PostgresCatalog::connect(config, max_conns).await?)),
    }
}
