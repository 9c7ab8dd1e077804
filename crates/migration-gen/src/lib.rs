//! # migration-gen
//!
//! Generate Laravel migration files from a live database schema.
//!
//! This library inspects the catalog of a connected MySQL or PostgreSQL
//! database and renders one migration source file per table:
//!
//! - **Catalog introspection** for tables, columns, and primary keys
//! - **Type mapping** from native column types to schema-builder types
//! - **Composite primary key** support
//! - **Template-driven rendering** with a user-editable stub
//!
//! ## Example
//!
//! ```rust,no_run
//! use migration_gen::{catalog, Config, Generator, Template};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> migration_gen::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let (_, conn) = config.resolve_connection(None)?;
//!     let reader = catalog::connect(conn, 4).await?;
//!     let generator = Generator::new(reader, Template::embedded(), &config.generator);
//!     let result = generator.run(CancellationToken::new()).await?;
//!     println!("Generated {} migrations", result.tables_generated);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod dialect;
pub mod error;
pub mod generator;
pub mod render;
pub mod schema;
pub mod typemap;

// Re-exports for convenient access
pub use catalog::{CatalogReader, RawColumn};
pub use config::{Config, ConnectionConfig, GeneratorConfig};
pub use dialect::Dialect;
pub use error::{GenError, Result};
pub use generator::{GenerateResult, Generator};
pub use render::{RenderedMigration, Template};
pub use schema::{ColumnDescriptor, TableSchema};
pub use typemap::LogicalType;
