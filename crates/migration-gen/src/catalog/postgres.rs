//! PostgreSQL catalog reader implementation.
//!
//! Implements the `CatalogReader` trait by querying `pg_catalog` and
//! `information_schema`. Uses deadpool-postgres for connection pooling.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::Config as PgConfig;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::{GenError, Result};

use super::{CatalogReader, RawColumn};

/// PostgreSQL catalog reader implementation.
pub struct PostgresCatalog {
    pool: Pool,
    schema: String,
}

impl PostgresCatalog {
    /// Create a new PostgreSQL catalog reader from configuration.
    pub async fn connect(config: &ConnectionConfig, max_conns: usize) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.effective_port());
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(max_conns)
            .build()
            .map_err(|e| GenError::connection(e, "creating PostgreSQL pool"))?;

        // Test connection
        let client = pool
            .get()
            .await
            .map_err(|e| GenError::connection(e, "testing PostgreSQL connection"))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| GenError::connection(e, "testing PostgreSQL connection"))?;

        info!(
            "Connected to PostgreSQL: {}:{}/{} (schema: {})",
            config.host,
            config.effective_port(),
            config.database,
            config.schema
        );

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GenError::connection(e, "getting connection for list_tables"))?;

        let query = r#"
            SELECT tablename::text
            FROM pg_catalog.pg_tables
            WHERE schemaname = $1
            ORDER BY tablename
        "#;

        let rows = client
            .query(query, &[&self.schema])
            .await
            .map_err(|e| GenError::connection(e, "listing PostgreSQL tables"))?;

        Ok(rows.into_iter().map(|row| row.get::<_, String>(0)).collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GenError::connection(e, "getting connection for list_columns"))?;

        // data_type carries the canonical spelling ("character varying",
        // "timestamp without time zone") that the exact-match mapping expects.
        let query = r#"
            SELECT
                column_name::text,
                data_type::text,
                CASE WHEN is_nullable = 'YES' THEN true ELSE false END,
                column_default::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let rows = client
            .query(query, &[&self.schema, &table])
            .await
            .map_err(|e| {
                GenError::connection(e, format!("loading PostgreSQL columns for {}", table))
            })?;

        Ok(rows
            .into_iter()
            .map(|row| RawColumn {
                name: row.get::<_, String>(0),
                raw_type: row.get::<_, String>(1),
                nullable: row.get::<_, bool>(2),
                default_value: row.get::<_, Option<String>>(3),
            })
            .collect())
    }

    async fn list_primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| GenError::connection(e, "getting connection for primary key"))?;

        let query = r#"
            SELECT a.attname::text
            FROM pg_catalog.pg_index i
            JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_catalog.pg_attribute a
                ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey)
            WHERE i.indisprimary AND n.nspname = $1 AND c.relname = $2
            ORDER BY array_position(i.indkey::int2[], a.attnum)
        "#;

        let rows = client
            .query(query, &[&self.schema, &table])
            .await
            .map_err(|e| {
                GenError::connection(e, format!("loading PostgreSQL primary key for {}", table))
            })?;

        Ok(rows.into_iter().map(|row| row.get::<_, String>(0)).collect())
    }
}
