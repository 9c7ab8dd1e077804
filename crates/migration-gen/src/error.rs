//! Error types for the generator library.

use thiserror::Error;

/// Main error type for generation operations.
#[derive(Error, Debug)]
pub enum GenError {
    /// Configuration error (invalid YAML, unknown connection name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query error with context
    #[error("Database error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// The connection's driver is not one of the supported dialects
    #[error("Unsupported driver '{0}'. Only MySQL and PostgreSQL are supported.")]
    UnsupportedDialect(String),

    /// The database reported no tables to generate from
    #[error("No tables found in the database.")]
    EmptyCatalog,

    /// A single table reported no columns (skipped, not fatal)
    #[error("Table {0} has no introspectable columns")]
    NoColumns(String),

    /// Template file missing at the configured path
    #[error("Migration template not found at: {0}")]
    TemplateNotFound(String),

    /// Template is missing a required placeholder
    #[error("Malformed template: missing placeholder {0}")]
    MalformedTemplate(&'static str),

    /// Writing a generated file failed (local to one table)
    #[error("Write failed for table {table}: {message}")]
    Write { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generation was cancelled (SIGINT, etc.)
    #[error("Generation cancelled")]
    Cancelled,
}

impl GenError {
    /// Create a Connection error with context about where it occurred.
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        GenError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Write error for a specific table.
    pub fn write(table: impl Into<String>, message: impl ToString) -> Self {
        GenError::Write {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            GenError::Config(_) | GenError::Yaml(_) => 2,
            GenError::Connection { .. } => 3,
            GenError::UnsupportedDialect(_) => 4,
            GenError::EmptyCatalog => 5,
            GenError::TemplateNotFound(_) | GenError::MalformedTemplate(_) => 6,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct_per_class() {
        assert_eq!(GenError::Config("x".into()).exit_code(), 2);
        assert_eq!(GenError::connection("x", "y").exit_code(), 3);
        assert_eq!(GenError::UnsupportedDialect("sqlite".into()).exit_code(), 4);
        assert_eq!(GenError::EmptyCatalog.exit_code(), 5);
        assert_eq!(GenError::TemplateNotFound("t".into()).exit_code(), 6);
        assert_eq!(GenError::MalformedTemplate("{{ columns }}").exit_code(), 6);
        assert_eq!(GenError::NoColumns("t".into()).exit_code(), 1);
    }

    #[test]
    fn test_write_helper() {
        let err = GenError::write("users", "disk full");
        assert!(err.to_string().contains("users"));
        assert!(err.to_string().contains("disk full"));
    }
}
