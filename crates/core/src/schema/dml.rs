//! Descriptor-driven DML text for the generic tenant table repository.
//!
//! Every builder validates column names against the descriptor and emits
//! `?` placeholders; callers bind values in the order the columns were given,
//! followed by the key where the statement has one.

use thiserror::Error;

use crate::schema::ddl::{qualified_table, quote_ident};
use crate::schema::descriptor::TableDescriptor;

/// Errors raised while building DML for a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DmlError {
    /// Column is not part of the table.
    #[error("Unknown column {column} on table {table}")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Offending column.
        column: String,
    },

    /// Keyed access on a table without a primary key.
    #[error("Table {0} has no primary key")]
    NoPrimaryKey(String),

    /// Insert or update without any column.
    #[error("No columns given for table {0}")]
    EmptyColumnSet(String),
}

impl DmlError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            Self::NoPrimaryKey(_) => "NO_PRIMARY_KEY",
            Self::EmptyColumnSet(_) => "EMPTY_COLUMN_SET",
        }
    }
}

fn check_columns(descriptor: &TableDescriptor, columns: &[&str]) -> Result<(), DmlError> {
    if columns.is_empty() {
        return Err(DmlError::EmptyColumnSet(descriptor.name.clone()));
    }
    match columns.iter().find(|c| !descriptor.has_column(c)) {
        Some(column) => Err(DmlError::UnknownColumn {
            table: descriptor.name.clone(),
            column: (*column).to_string(),
        }),
        None => Ok(()),
    }
}

fn key_column(descriptor: &TableDescriptor) -> Result<String, DmlError> {
    descriptor
        .primary_key()
        .map(|c| quote_ident(&c.name))
        .ok_or_else(|| DmlError::NoPrimaryKey(descriptor.name.clone()))
}

/// `INSERT INTO ... (cols) VALUES (?, ...)`.
pub fn insert_statement(
    schema: &str,
    descriptor: &TableDescriptor,
    columns: &[&str],
) -> Result<String, DmlError> {
    check_columns(descriptor, columns)?;

    let names = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");

    Ok(format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        qualified_table(schema, &descriptor.name)
    ))
}

/// `SELECT * ... WHERE key = ?`.
pub fn select_by_key_statement(
    schema: &str,
    descriptor: &TableDescriptor,
) -> Result<String, DmlError> {
    let key = key_column(descriptor)?;
    Ok(format!(
        "SELECT * FROM {} WHERE {key} = ?",
        qualified_table(schema, &descriptor.name)
    ))
}

/// `UPDATE ... SET col = ?, ... WHERE key = ?`.
pub fn update_by_key_statement(
    schema: &str,
    descriptor: &TableDescriptor,
    columns: &[&str],
) -> Result<String, DmlError> {
    check_columns(descriptor, columns)?;
    let key = key_column(descriptor)?;

    let assignments = columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "UPDATE {} SET {assignments} WHERE {key} = ?",
        qualified_table(schema, &descriptor.name)
    ))
}

/// `DELETE ... WHERE key = ?`.
pub fn delete_by_key_statement(
    schema: &str,
    descriptor: &TableDescriptor,
) -> Result<String, DmlError> {
    let key = key_column(descriptor)?;
    Ok(format!(
        "DELETE FROM {} WHERE {key} = ?",
        qualified_table(schema, &descriptor.name)
    ))
}

/// `SELECT * ... ORDER BY key LIMIT ? OFFSET ?`.
pub fn list_statement(schema: &str, descriptor: &TableDescriptor) -> Result<String, DmlError> {
    let key = key_column(descriptor)?;
    Ok(format!(
        "SELECT * FROM {} ORDER BY {key} LIMIT ? OFFSET ?",
        qualified_table(schema, &descriptor.name)
    ))
}
