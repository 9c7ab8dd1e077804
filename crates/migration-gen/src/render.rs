//! Migration rendering: template handling and block construction.
//!
//! Rendering is literal placeholder substitution - no conditionals, no
//! loops. All branching (shorthand vs typed column, composite key or not)
//! happens while building the blocks, so `render` stays deterministic:
//! the same schema and template always produce byte-identical output.

use std::path::{Path, PathBuf};

use crate::error::{GenError, Result};
use crate::schema::{ColumnDescriptor, TableSchema};

/// Placeholder for the table name.
pub const PLACEHOLDER_TABLE: &str = "{{ tableName }}";
/// Placeholder for the column declaration block.
pub const PLACEHOLDER_COLUMNS: &str = "{{ columns }}";
/// Placeholder for the composite primary key block.
pub const PLACEHOLDER_PRIMARY_KEYS: &str = "{{ compositePrimaryKeys }}";

/// Indentation of statements inside the Schema::create closure.
const BODY_INDENT: &str = "            ";

/// The stub shipped with the crate, used when no user template is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/migration.stub");

/// A validated migration template.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
}

impl Template {
    /// The compiled-in default stub.
    pub fn embedded() -> Self {
        // Validity is covered by a unit test against DEFAULT_TEMPLATE.
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Load and validate a user template from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GenError::TemplateNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_text(text)
    }

    /// Validate template text: all three placeholders must be present.
    pub fn from_text(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        for placeholder in [PLACEHOLDER_TABLE, PLACEHOLDER_COLUMNS, PLACEHOLDER_PRIMARY_KEYS] {
            if !text.contains(placeholder) {
                return Err(GenError::MalformedTemplate(placeholder));
            }
        }
        Ok(Self { text })
    }

    /// Render one table's migration source.
    pub fn render(&self, schema: &TableSchema) -> String {
        self.text
            .replace(PLACEHOLDER_TABLE, &schema.name)
            .replace(PLACEHOLDER_COLUMNS, &columns_block(schema))
            .replace(PLACEHOLDER_PRIMARY_KEYS, &primary_key_block(schema))
    }
}

/// A rendered migration, ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedMigration {
    /// Table the migration creates.
    pub table_name: String,

    /// Generated source text.
    pub source_text: String,

    /// Destination file path.
    pub target_path: PathBuf,
}

/// One declaration line per column, in catalog order. Lines after the
/// first carry the closure body indentation; the first line takes its
/// indentation from the placeholder position in the template.
fn columns_block(schema: &TableSchema) -> String {
    let lines: Vec<String> = schema
        .columns
        .iter()
        .map(|column| {
            if schema.uses_id_shorthand(column) {
                "$table->id();".to_string()
            } else {
                column_line(column)
            }
        })
        .collect();

    lines.join(&format!("\n{}", BODY_INDENT))
}

fn column_line(column: &ColumnDescriptor) -> String {
    let mut line = format!(
        "$table->{}('{}')",
        column.logical_type.builder_method(),
        column.name
    );
    if column.nullable {
        line.push_str("->nullable()");
    }
    if let Some(ref default) = column.default_value {
        line.push_str(&format!("->default('{}')", escape_single_quoted(default)));
    }
    line.push(';');
    line
}

/// Empty unless the (deduplicated) primary key spans 2+ columns, in which
/// case one `$table->primary([...])` line is appended after the columns.
fn primary_key_block(schema: &TableSchema) -> String {
    if !schema.has_composite_primary_key() {
        return String::new();
    }

    let quoted: Vec<String> = schema
        .primary_key
        .iter()
        .map(|name| format!("'{}'", name))
        .collect();

    format!("\n{}$table->primary([{}]);", BODY_INDENT, quoted.join(", "))
}

/// Escape a catalog default expression for a PHP single-quoted literal.
fn escape_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RawColumn;
    use crate::dialect::Dialect;

    fn raw(name: &str, raw_type: &str, nullable: bool, default: Option<&str>) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            raw_type: raw_type.to_string(),
            nullable,
            default_value: default.map(|s| s.to_string()),
        }
    }

    fn mysql_schema(rows: Vec<RawColumn>, pk: &[&str]) -> TableSchema {
        TableSchema::from_catalog(
            "users",
            rows,
            pk.iter().map(|s| s.to_string()).collect(),
            Dialect::Mysql,
        )
        .unwrap()
    }

    #[test]
    fn test_embedded_template_is_valid() {
        assert!(Template::from_text(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn test_missing_placeholder_is_rejected() {
        let err = Template::from_text("create {{ tableName }} with {{ columns }}").unwrap_err();
        assert!(matches!(
            err,
            GenError::MalformedTemplate(PLACEHOLDER_PRIMARY_KEYS)
        ));
    }

    #[test]
    fn test_template_not_found() {
        let err = Template::load("/no/such/migration.stub").unwrap_err();
        assert!(matches!(err, GenError::TemplateNotFound(_)));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_single_integer_id_uses_shorthand() {
        // MySQL-like raw column {Field:"id", Type:"bigint", Null:"NO"}, sole PK
        let schema = mysql_schema(vec![raw("id", "bigint", false, None)], &["id"]);
        let out = Template::embedded().render(&schema);

        assert!(out.contains("$table->id();"));
        assert!(!out.contains("$table->integer('id')"));
        assert!(!out.contains("$table->primary("));
    }

    #[test]
    fn test_nullable_string_without_default() {
        // Postgres-like raw column: character varying, is_nullable YES, no default
        let schema = TableSchema::from_catalog(
            "users",
            vec![raw("email", "character varying", true, None)],
            vec![],
            Dialect::Postgres,
        )
        .unwrap();
        let out = Template::embedded().render(&schema);

        assert!(out.contains("$table->string('email')->nullable();"));
        assert!(!out.contains("->default("));
    }

    #[test]
    fn test_composite_primary_key_block() {
        let schema = mysql_schema(
            vec![
                raw("tenant_id", "bigint", false, None),
                raw("id", "bigint", false, None),
            ],
            &["tenant_id", "id"],
        );
        let out = Template::embedded().render(&schema);

        assert!(out.contains("$table->primary(['tenant_id', 'id']);"));
        // Neither column may use the shorthand under a composite key
        assert!(!out.contains("$table->id();"));
        assert!(out.contains("$table->integer('id');"));
        assert!(out.contains("$table->integer('tenant_id');"));
    }

    #[test]
    fn test_duplicate_pk_rows_deduplicated() {
        let schema = mysql_schema(
            vec![
                raw("a", "int", false, None),
                raw("b", "int", false, None),
            ],
            &["a", "b", "a"],
        );
        let out = Template::embedded().render(&schema);
        assert!(out.contains("$table->primary(['a', 'b']);"));
    }

    #[test]
    fn test_default_value_rendered_and_escaped() {
        let schema = mysql_schema(
            vec![raw("note", "varchar(255)", false, Some("it's \\ tricky"))],
            &[],
        );
        let out = Template::embedded().render(&schema);
        assert!(out.contains("$table->string('note')->default('it\\'s \\\\ tricky');"));
    }

    #[test]
    fn test_table_name_substituted_in_up_and_down() {
        let schema = mysql_schema(vec![raw("id", "bigint", false, None)], &["id"]);
        let out = Template::embedded().render(&schema);
        assert_eq!(out.matches("'users'").count(), 2);
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let schema = mysql_schema(
            vec![
                raw("id", "bigint", false, None),
                raw("email", "varchar(255)", true, None),
                raw("status", "enum('a','b')", false, Some("a")),
            ],
            &["id"],
        );
        let template = Template::embedded();
        assert_eq!(template.render(&schema), template.render(&schema));
    }

    #[test]
    fn test_column_order_preserved_in_output() {
        let schema = mysql_schema(
            vec![
                raw("zeta", "varchar(10)", false, None),
                raw("alpha", "varchar(10)", false, None),
            ],
            &[],
        );
        let out = Template::embedded().render(&schema);
        let zeta = out.find("'zeta'").unwrap();
        let alpha = out.find("'alpha'").unwrap();
        assert!(zeta < alpha);
    }
}
