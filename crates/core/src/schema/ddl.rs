//! DDL text generation.
//!
//! Pure string builders for the MySQL dialect. A tenant schema is a MySQL
//! database, so every table reference is qualified as `` `schema`.`table` ``.
//! Identifiers are backtick-quoted with embedded backticks doubled.

use std::fmt;

use crate::schema::descriptor::{ColumnDef, TableDescriptor};

/// Quotes a single identifier.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quotes a schema-qualified table reference.
#[must_use]
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn column_definition(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", quote_ident(&column.name), column.sql_type);
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    }
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    sql
}

/// `CREATE DATABASE` for a tenant schema.
#[must_use]
pub fn create_schema_statement(schema: &str) -> String {
    format!("CREATE DATABASE {}", quote_ident(schema))
}

/// `CREATE TABLE` with columns in descriptor order.
#[must_use]
pub fn create_table_statement(descriptor: &TableDescriptor, schema: &str) -> String {
    let columns = descriptor
        .columns
        .iter()
        .map(column_definition)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE {} ({columns})",
        qualified_table(schema, &descriptor.name)
    )
}

/// `ALTER TABLE ... ADD COLUMN`, optionally positioned with `AFTER`.
#[must_use]
pub fn add_column_statement(
    schema: &str,
    table: &str,
    column: &str,
    sql_type: &str,
    insert_after: Option<&str>,
) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {sql_type}",
        qualified_table(schema, table),
        quote_ident(column)
    );
    if let Some(after) = insert_after {
        sql.push_str(" AFTER ");
        sql.push_str(&quote_ident(after));
    }
    sql
}

/// `ALTER TABLE ... DROP COLUMN`.
#[must_use]
pub fn drop_column_statement(schema: &str, table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}",
        qualified_table(schema, table),
        quote_ident(column)
    )
}

/// `ALTER TABLE ... ADD FOREIGN KEY`. The constraint is left unnamed so the
/// server generates its name.
#[must_use]
pub fn add_foreign_key_statement(
    schema: &str,
    table: &str,
    column: &str,
    referenced_table: &str,
    referenced_column: &str,
) -> String {
    format!(
        "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({})",
        qualified_table(schema, table),
        quote_ident(column),
        qualified_table(schema, referenced_table),
        quote_ident(referenced_column)
    )
}

/// `ALTER TABLE ... DROP FOREIGN KEY` by live constraint name.
#[must_use]
pub fn drop_foreign_key_statement(schema: &str, table: &str, constraint: &str) -> String {
    format!(
        "ALTER TABLE {} DROP FOREIGN KEY {}",
        qualified_table(schema, table),
        quote_ident(constraint)
    )
}

/// One mutating statement the orchestrator issues.
///
/// Executors receive the structured form and render it with [`DdlStatement::sql`];
/// the structure lets catalog doubles apply the change without parsing SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlStatement {
    /// Create a tenant schema.
    CreateSchema {
        /// Schema name.
        schema: String,
    },
    /// Create a table from its descriptor.
    CreateTable {
        /// Schema name.
        schema: String,
        /// Table definition.
        descriptor: TableDescriptor,
    },
    /// Add a column.
    AddColumn {
        /// Schema name.
        schema: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Column SQL type.
        sql_type: String,
        /// Column the new one follows.
        insert_after: Option<String>,
    },
    /// Drop a column.
    DropColumn {
        /// Schema name.
        schema: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// Add an unnamed foreign key.
    AddForeignKey {
        /// Schema name.
        schema: String,
        /// Table name.
        table: String,
        /// Referencing column.
        column: String,
        /// Referenced table.
        referenced_table: String,
        /// Referenced column.
        referenced_column: String,
    },
    /// Drop a foreign key by constraint name.
    DropForeignKey {
        /// Schema name.
        schema: String,
        /// Table name.
        table: String,
        /// Live constraint name.
        constraint: String,
    },
}

impl DdlStatement {
    /// The tenant schema the statement targets.
    #[must_use]
    pub fn schema(&self) -> &str {
        match self {
            Self::CreateSchema { schema }
            | Self::CreateTable { schema, .. }
            | Self::AddColumn { schema, .. }
            | Self::DropColumn { schema, .. }
            | Self::AddForeignKey { schema, .. }
            | Self::DropForeignKey { schema, .. } => schema,
        }
    }

    /// Renders the statement as SQL text.
    #[must_use]
    pub fn sql(&self) -> String {
        match self {
            Self::CreateSchema { schema } => create_schema_statement(schema),
            Self::CreateTable { schema, descriptor } => create_table_statement(descriptor, schema),
            Self::AddColumn {
                schema,
                table,
                column,
                sql_type,
                insert_after,
            } => add_column_statement(schema, table, column, sql_type, insert_after.as_deref()),
            Self::DropColumn {
                schema,
                table,
                column,
            } => drop_column_statement(schema, table, column),
            Self::AddForeignKey {
                schema,
                table,
                column,
                referenced_table,
                referenced_column,
            } => add_foreign_key_statement(
                schema,
                table,
                column,
                referenced_table,
                referenced_column,
            ),
            Self::DropForeignKey {
                schema,
                table,
                constraint,
            } => drop_foreign_key_statement(schema, table, constraint),
        }
    }
}

impl fmt::Display for DdlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}
