//! Normalized intermediate schema model.
//!
//! A [`TableSchema`] is assembled fresh per table per run from live catalog
//! rows, handed to the renderer, and discarded. Nothing here is persisted.

use crate::catalog::RawColumn;
use crate::dialect::Dialect;
use crate::error::{GenError, Result};
use crate::typemap::{map_column_type, LogicalType};

/// One column of a table, normalized for code generation.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Native type spelling as reported by the catalog.
    pub raw_type: String,

    /// Normalized logical type.
    pub logical_type: LogicalType,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Default expression, preserved verbatim from the catalog.
    pub default_value: Option<String>,
}

impl ColumnDescriptor {
    fn from_raw(raw: RawColumn, dialect: Dialect) -> Self {
        let logical_type = map_column_type(dialect, &raw.raw_type);
        Self {
            name: raw.name,
            raw_type: raw.raw_type,
            logical_type,
            nullable: raw.nullable,
            default_value: raw.default_value,
        }
    }
}

/// Normalized schema of one table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Columns in catalog ordinal order.
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column names, deduplicated, in key order.
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Assemble a table schema from raw catalog rows.
    ///
    /// Fails with [`GenError::NoColumns`] when the table reports zero
    /// columns; the orchestrator treats that as skip-with-warning.
    pub fn from_catalog(
        name: impl Into<String>,
        rows: Vec<RawColumn>,
        primary_key: Vec<String>,
        dialect: Dialect,
    ) -> Result<Self> {
        let name = name.into();

        if rows.is_empty() {
            return Err(GenError::NoColumns(name));
        }

        let columns = rows
            .into_iter()
            .map(|raw| ColumnDescriptor::from_raw(raw, dialect))
            .collect();

        // The pg key catalog can report a column once per index participation;
        // keep first-seen order while deduplicating.
        let mut deduped: Vec<String> = Vec::with_capacity(primary_key.len());
        for key in primary_key {
            if !deduped.contains(&key) {
                deduped.push(key);
            }
        }

        Ok(Self {
            name,
            columns,
            primary_key: deduped,
        })
    }

    /// Whether the primary key spans two or more columns.
    pub fn has_composite_primary_key(&self) -> bool {
        self.primary_key.len() >= 2
    }

    /// Whether a column renders via the auto-increment `id` shorthand.
    ///
    /// Only a column named exactly `id`, with logical type Integer, that is
    /// the sole primary key column. An `id` inside a composite key renders
    /// as a plain typed column; the composite-key clause declares the full
    /// key set separately.
    pub fn uses_id_shorthand(&self, column: &ColumnDescriptor) -> bool {
        column.name == "id"
            && column.logical_type == LogicalType::Integer
            && self.primary_key.len() == 1
            && self.primary_key[0] == "id"
    }
}
