//! Generation orchestrator - drives the per-table pipeline.
//!
//! A run enumerates the catalog once, then processes each table through
//! read -> normalize -> render -> write. Tables share no mutable state, so
//! they are processed with bounded parallelism. Per-table failures never
//! abort the run; whole-run preconditions (connection, dialect, template,
//! non-empty catalog) abort before any file is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::catalog::CatalogReader;
use crate::config::GeneratorConfig;
use crate::error::{GenError, Result};
use crate::render::{RenderedMigration, Template};
use crate::schema::TableSchema;

/// The framework's own bookkeeping table, always excluded.
const MIGRATIONS_TABLE: &str = "migrations";

/// Generation orchestrator.
pub struct Generator {
    catalog: Arc<dyn CatalogReader>,
    template: Template,
    output_dir: PathBuf,
    exclude_tables: Vec<String>,
    workers: usize,
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed", "failed", or "cancelled".
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Tables considered after exclusions.
    pub tables_total: usize,

    /// Tables for which a migration file was written.
    pub tables_generated: usize,

    /// Tables skipped (no introspectable columns).
    pub tables_skipped: usize,

    /// Tables that failed.
    pub tables_failed: usize,

    /// List of failed table names.
    pub failed_tables: Vec<String>,

    /// Paths of all generated files.
    pub files: Vec<PathBuf>,
}

impl Generator {
    /// Create a new generator over a connected catalog reader.
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        template: Template,
        config: &GeneratorConfig,
    ) -> Self {
        Self {
            catalog,
            template,
            output_dir: config.output_dir.clone(),
            exclude_tables: config.exclude_tables.clone(),
            workers: config.workers.max(1),
        }
    }

    /// Run generation for every table in the catalog.
    pub async fn run(&self, cancel: CancellationToken) -> Result<GenerateResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!("Starting generation run: {}", run_id);

        // Phase 1: Enumerate tables
        let mut tables = self.catalog.list_tables().await?;
        tables.retain(|t| !self.is_excluded(t));

        if tables.is_empty() {
            return Err(GenError::EmptyCatalog);
        }

        info!("Found {} tables to generate migrations for", tables.len());

        // Phase 2: Generate per table with bounded parallelism. Filenames
        // come from a per-run cursor advancing one second per table, so
        // they stay unique and sort in dispatch order.
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let stamp_base = Local::now();
        let mut handles = Vec::new();

        for (index, table) in tables.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Cancellation requested, stopping new work");
                break;
            }

            let permit = semaphore.clone().acquire_owned().await.unwrap();

            let stamp = stamp_base + Duration::seconds(index as i64);
            let path = self
                .output_dir
                .join(migration_file_name(&stamp, table));

            let catalog = self.catalog.clone();
            let template = self.template.clone();
            let table_name = table.clone();

            let handle = tokio::spawn(async move {
                let result = generate_table(catalog, template, table_name, path).await;
                drop(permit);
                result
            });

            handles.push((table.clone(), handle));
        }

        // Phase 3: Collect results
        let mut tables_generated = 0;
        let mut tables_skipped = 0;
        let mut failed_tables = Vec::new();
        let mut files = Vec::new();

        for (table, handle) in handles {
            match handle.await {
                Ok(Ok(rendered)) => {
                    info!(
                        "Generated migration for table: {} -> {}",
                        table,
                        rendered.target_path.display()
                    );
                    tables_generated += 1;
                    files.push(rendered.target_path);
                }
                Ok(Err(GenError::NoColumns(t))) => {
                    warn!("{}: no columns reported, skipping", t);
                    tables_skipped += 1;
                }
                Ok(Err(e)) => {
                    error!("{}: failed - {}", table, e);
                    failed_tables.push(table);
                }
                Err(e) => {
                    error!("{}: task panicked - {}", table, e);
                    failed_tables.push(table);
                }
            }
        }

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let status = if cancel.is_cancelled() {
            "cancelled"
        } else if !failed_tables.is_empty() {
            "failed"
        } else {
            "completed"
        };

        let result = GenerateResult {
            run_id,
            status: status.to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            tables_total: tables.len(),
            tables_generated,
            tables_skipped,
            tables_failed: failed_tables.len(),
            failed_tables,
            files,
        };

        info!(
            "Generation {}: {}/{} tables in {:.1}s ({} skipped, {} failed)",
            result.status,
            result.tables_generated,
            result.tables_total,
            result.duration_seconds,
            result.tables_skipped,
            result.tables_failed
        );

        Ok(result)
    }

    fn is_excluded(&self, table: &str) -> bool {
        table == MIGRATIONS_TABLE || self.exclude_tables.iter().any(|t| t == table)
    }
}

impl GenerateResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Process one table: read catalog rows, normalize, render, write.
async fn generate_table(
    catalog: Arc<dyn CatalogReader>,
    template: Template,
    table: String,
    path: PathBuf,
) -> Result<RenderedMigration> {
    let rows = catalog.list_columns(&table).await?;
    let primary_key = catalog.list_primary_key_columns(&table).await?;

    let schema = TableSchema::from_catalog(&table, rows, primary_key, catalog.dialect())?;
    let source_text = template.render(&schema);

    write_atomic(&path, &source_text).map_err(|e| GenError::write(&table, e))?;

    Ok(RenderedMigration {
        table_name: table,
        source_text,
        target_path: path,
    })
}

/// Deterministic migration file name: `<stamp>_create_<table>_table.php`.
fn migration_file_name(stamp: &DateTime<Local>, table: &str) -> String {
    format!(
        "{}_create_{}_table.php",
        stamp.format("%Y_%m_%d_%H%M%S"),
        table
    )
}

/// Write via a temporary sibling and rename, so no partial file is ever
/// visible at the target path.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "migration.php".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawColumn;
    use crate::dialect::Dialect;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// In-memory catalog for pipeline tests.
    struct FakeCatalog {
        tables: Vec<String>,
        columns: HashMap<String, Vec<RawColumn>>,
        primary_keys: HashMap<String, Vec<String>>,
        unreadable: Vec<String>,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                tables: Vec::new(),
                columns: HashMap::new(),
                primary_keys: HashMap::new(),
                unreadable: Vec::new(),
            }
        }

        fn with_table(mut self, name: &str, columns: Vec<RawColumn>, pk: &[&str]) -> Self {
            self.tables.push(name.to_string());
            self.columns.insert(name.to_string(), columns);
            self.primary_keys
                .insert(name.to_string(), pk.iter().map(|s| s.to_string()).collect());
            self
        }

        /// A table whose column query fails, as on a transient read error.
        fn with_unreadable_table(mut self, name: &str) -> Self {
            self.tables.push(name.to_string());
            self.unreadable.push(name.to_string());
            self
        }
    }

    #[async_trait]
    impl CatalogReader for FakeCatalog {
        fn dialect(&self) -> Dialect {
            Dialect::Mysql
        }

        async fn list_tables(&self) -> crate::Result<Vec<String>> {
            Ok(self.tables.clone())
        }

        async fn list_columns(&self, table: &str) -> crate::Result<Vec<RawColumn>> {
            if self.unreadable.iter().any(|t| t == table) {
                return Err(GenError::connection(
                    "connection reset",
                    format!("loading columns for {}", table),
                ));
            }
            Ok(self.columns.get(table).cloned().unwrap_or_default())
        }

        async fn list_primary_key_columns(&self, table: &str) -> crate::Result<Vec<String>> {
            Ok(self.primary_keys.get(table).cloned().unwrap_or_default())
        }
    }

    fn id_column() -> RawColumn {
        RawColumn {
            name: "id".to_string(),
            raw_type: "bigint(20) unsigned".to_string(),
            nullable: false,
            default_value: None,
        }
    }

    fn generator(catalog: FakeCatalog, output_dir: &Path) -> Generator {
        let config = GeneratorConfig {
            output_dir: output_dir.to_path_buf(),
            ..GeneratorConfig::default()
        };
        Generator::new(Arc::new(catalog), Template::embedded(), &config)
    }

    #[tokio::test]
    async fn test_writes_one_file_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new()
            .with_table("users", vec![id_column()], &["id"])
            .with_table("posts", vec![id_column()], &["id"]);

        let result = generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, "completed");
        assert_eq!(result.tables_total, 2);
        assert_eq!(result.tables_generated, 2);
        assert_eq!(result.files.len(), 2);

        for file in &result.files {
            let text = std::fs::read_to_string(file).unwrap();
            assert!(text.contains("Schema::create"));
            assert!(text.contains("$table->id();"));
        }
    }

    #[tokio::test]
    async fn test_filenames_unique_and_sorted_within_one_second() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new()
            .with_table("aaa", vec![id_column()], &["id"])
            .with_table("bbb", vec![id_column()], &["id"])
            .with_table("ccc", vec![id_column()], &["id"]);

        let result = generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await
            .unwrap();

        let mut names: Vec<String> = result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let before = names.clone();
        names.sort();
        names.dedup();

        assert_eq!(names.len(), 3);
        // Dispatch order and lexicographic order agree
        assert_eq!(before, names);
        assert!(names[0] < names[1] && names[1] < names[2]);
    }

    #[tokio::test]
    async fn test_empty_catalog_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let result = generator(FakeCatalog::new(), dir.path())
            .run(CancellationToken::new())
            .await;
        assert!(matches!(result, Err(GenError::EmptyCatalog)));
    }

    #[tokio::test]
    async fn test_bookkeeping_table_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new()
            .with_table("migrations", vec![id_column()], &["id"])
            .with_table("users", vec![id_column()], &["id"]);

        let result = generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.tables_total, 1);
        assert_eq!(result.tables_generated, 1);
        let name = result.files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_create_users_table.php"));
    }

    #[tokio::test]
    async fn test_only_bookkeeping_table_means_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new().with_table("migrations", vec![id_column()], &["id"]);

        let result = generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await;
        assert!(matches!(result, Err(GenError::EmptyCatalog)));
    }

    #[tokio::test]
    async fn test_table_without_columns_skipped_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new()
            .with_table("broken", vec![], &[])
            .with_table("users", vec![id_column()], &["id"]);

        let result = generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, "completed");
        assert_eq!(result.tables_skipped, 1);
        assert_eq!(result.tables_generated, 1);
        assert_eq!(result.tables_failed, 0);
    }

    #[tokio::test]
    async fn test_failed_table_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new()
            .with_unreadable_table("flaky")
            .with_table("users", vec![id_column()], &["id"]);

        let result = generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, "failed");
        assert_eq!(result.tables_failed, 1);
        assert_eq!(result.failed_tables, vec!["flaky".to_string()]);
        // The other table still generates
        assert_eq!(result.tables_generated, 1);
        assert_eq!(result.files.len(), 1);
        let name = result.files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_create_users_table.php"));
        assert!(std::fs::read_to_string(&result.files[0])
            .unwrap()
            .contains("Schema::create"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new().with_table("users", vec![id_column()], &["id"]);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = generator(catalog, dir.path()).run(cancel).await.unwrap();

        assert_eq!(result.status, "cancelled");
        assert_eq!(result.tables_generated, 0);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_no_partial_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new().with_table("users", vec![id_column()], &["id"]);

        generator(catalog, dir.path())
            .run(CancellationToken::new())
            .await
            .unwrap();

        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "leftover temp file: {}", name);
        }
    }

    #[test]
    fn test_migration_file_name_format() {
        let stamp = Local::now();
        let name = migration_file_name(&stamp, "users");
        assert!(name.ends_with("_create_users_table.php"));
        // Y_m_d_His prefix: 4+1+2+1+2+1+6 = 17 chars
        assert_eq!(name.len(), 17 + "_create_users_table.php".len());
    }
}
