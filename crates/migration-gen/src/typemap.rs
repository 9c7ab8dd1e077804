//! Type mapping from native column types to schema-builder types.
//!
//! Pure and total: every native type string maps to some [`LogicalType`],
//! with `String` as the lenient fallback for anything unrecognized. The
//! fallback is policy, not an error - generation never fails because of an
//! exotic column type.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// Normalized, dialect-independent column type.
///
/// Variants correspond one-to-one with the schema-builder methods emitted
/// into generated migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    Integer,
    String,
    Text,
    Boolean,
    Date,
    Timestamp,
    Float,
    Decimal,
    Enum,
    Binary,
    Json,
}

impl LogicalType {
    /// The Blueprint method name used in generated code.
    pub fn builder_method(&self) -> &'static str {
        match self {
            LogicalType::Integer => "integer",
            LogicalType::String => "string",
            LogicalType::Text => "text",
            LogicalType::Boolean => "boolean",
            LogicalType::Date => "date",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Float => "float",
            LogicalType::Decimal => "decimal",
            LogicalType::Enum => "enum",
            LogicalType::Binary => "binary",
            LogicalType::Json => "json",
        }
    }
}

/// Map a native column type to a logical type for the given dialect.
pub fn map_column_type(dialect: Dialect, raw_type: &str) -> LogicalType {
    match dialect {
        Dialect::Mysql => map_mysql_type(raw_type),
        Dialect::Postgres => map_postgres_type(raw_type),
    }
}

/// MySQL column types are matched by substring against the full column
/// spelling (e.g. `bigint(20) unsigned`, `enum('a','b')`). First match
/// wins, in this priority order.
fn map_mysql_type(raw_type: &str) -> LogicalType {
    if raw_type.contains("int") {
        LogicalType::Integer
    } else if raw_type.contains("varchar") {
        LogicalType::String
    } else if raw_type.contains("text") {
        LogicalType::Text
    } else if raw_type.contains("date") {
        LogicalType::Date
    } else if raw_type.contains("timestamp") {
        LogicalType::Timestamp
    } else if raw_type.contains("float") || raw_type.contains("double") {
        LogicalType::Float
    } else if raw_type.contains("decimal") {
        LogicalType::Decimal
    } else if raw_type.contains("enum") {
        LogicalType::Enum
    } else if raw_type.contains("blob") {
        LogicalType::Binary
    } else {
        LogicalType::String
    }
}

/// PostgreSQL reports canonical type names in `information_schema.columns`,
/// so an exact-match table suffices.
fn map_postgres_type(raw_type: &str) -> LogicalType {
    match raw_type {
        "smallint" | "integer" | "bigint" => LogicalType::Integer,
        "character varying" | "varchar" | "char" | "text" => LogicalType::String,
        "boolean" => LogicalType::Boolean,
        "date" => LogicalType::Date,
        "timestamp without time zone" | "timestamp with time zone" => LogicalType::Timestamp,
        "numeric" | "decimal" => LogicalType::Decimal,
        "real" | "double precision" => LogicalType::Float,
        "bytea" => LogicalType::Binary,
        "json" | "jsonb" => LogicalType::Json,
        _ => LogicalType::String,
    }
}
