//! Catalog seams: existence checks and DDL execution.
//!
//! The orchestrator only ever talks to the tenant store through these two
//! traits. Every check returns `Result<bool, _>`; an error means existence is
//! unknown and must never be read as `false`.

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::DdlStatement;

/// Errors raised by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A metadata query failed; existence is unknown.
    #[error("Metadata query failed: {0}")]
    Query(String),

    /// A DDL statement was rejected.
    #[error("Statement failed: {0}")]
    Statement(String),
}

impl CatalogError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Query(_) => "METADATA_QUERY_FAILED",
            Self::Statement(_) => "STATEMENT_FAILED",
        }
    }
}

/// Read-only checks against catalog metadata.
#[async_trait]
pub trait CatalogIntrospector: Send + Sync {
    /// Does the schema exist.
    async fn schema_exists(&self, schema: &str) -> Result<bool, CatalogError>;

    /// Does the table exist in the schema.
    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, CatalogError>;

    /// Does the column exist on the table.
    async fn column_exists(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, CatalogError>;

    /// Is there a foreign key on the column.
    async fn foreign_key_exists(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, CatalogError>;

    /// Name of the live foreign-key constraint from `column` to `referenced_table`.
    ///
    /// Constraint names are generated by the store, so dropping one starts here.
    async fn foreign_key_constraint(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        referenced_table: &str,
    ) -> Result<Option<String>, CatalogError>;
}

/// Executes one DDL statement. Success is the absence of an error.
#[async_trait]
pub trait DdlExecutor: Send + Sync {
    /// Runs the statement.
    async fn execute_ddl(&self, statement: &DdlStatement) -> Result<(), CatalogError>;
}
