//! MySQL/MariaDB catalog reader implementation.
//!
//! Implements the `CatalogReader` trait by querying `information_schema`.
//! Uses SQLx for connection pooling and async query execution.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::Row;
use tracing::info;

use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::{GenError, Result};

use super::{CatalogReader, RawColumn};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// MySQL/MariaDB catalog reader implementation.
pub struct MysqlCatalog {
    pool: MySqlPool,
    database: String,
}

impl MysqlCatalog {
    /// Create a new MySQL catalog reader from configuration.
    pub async fn connect(config: &ConnectionConfig, max_conns: usize) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.effective_port())
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns as u32)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| GenError::connection(e, "creating MySQL pool"))?;

        // Test connection
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| GenError::connection(e, "testing MySQL connection"))?;

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host,
            config.effective_port(),
            config.database
        );

        Ok(Self {
            pool,
            database: config.database.clone(),
        })
    }
}

#[async_trait]
impl CatalogReader for MysqlCatalog {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        // CAST to CHAR to handle collation differences
        let query = r#"
            SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GenError::connection(e, "listing MySQL tables"))?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("TABLE_NAME"))
            .collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>> {
        // COLUMN_TYPE keeps the full spelling ("bigint(20) unsigned",
        // "enum('a','b')"), which the substring type mapping relies on.
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
                IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GenError::connection(e, format!("loading MySQL columns for {}", table)))?;

        Ok(rows
            .into_iter()
            .map(|row| RawColumn {
                name: row.get::<String, _>("COLUMN_NAME"),
                raw_type: row.get::<String, _>("COLUMN_TYPE"),
                nullable: row.get::<i32, _>("is_nullable") == 1,
                default_value: row.get::<Option<String>, _>("COLUMN_DEFAULT"),
            })
            .collect())
    }

    async fn list_primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        let query = r#"
            SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
            FROM INFORMATION_SCHEMA.STATISTICS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME = 'PRIMARY'
            ORDER BY SEQ_IN_INDEX
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                GenError::connection(e, format!("loading MySQL primary key for {}", table))
            })?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("COLUMN_NAME"))
            .collect())
    }
}
