//! MySQL catalog introspection and DDL execution.
//!
//! Existence checks read `information_schema` with bound parameters. DDL runs
//! unprepared, one statement per call, with no surrounding transaction; MySQL
//! commits DDL implicitly, so a partially provisioned tenant is a normal
//! intermediate state the next run picks up from.

use async_trait::async_trait;
use bizhub_core::provisioning::{CatalogError, CatalogIntrospector, DdlExecutor};
use bizhub_core::schema::DdlStatement;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement, Value};
use tracing::debug;

const SCHEMA_EXISTS_SQL: &str =
    "SELECT COUNT(*) AS n FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?";

const TABLE_EXISTS_SQL: &str = "SELECT COUNT(*) AS n FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

const COLUMN_EXISTS_SQL: &str = "SELECT COUNT(*) AS n FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?";

const FOREIGN_KEY_EXISTS_SQL: &str = "SELECT COUNT(*) AS n FROM information_schema.KEY_COLUMN_USAGE \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ? \
     AND REFERENCED_TABLE_NAME IS NOT NULL";

const FOREIGN_KEY_NAME_SQL: &str = "SELECT CONSTRAINT_NAME AS name FROM information_schema.KEY_COLUMN_USAGE \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ? \
     AND REFERENCED_TABLE_NAME = ? \
     ORDER BY CONSTRAINT_NAME LIMIT 1";

/// Catalog backed by the shared MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MySqlCatalog {
    db: DatabaseConnection,
}

impl MySqlCatalog {
    /// Creates a catalog over the pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn count(&self, sql: &str, values: Vec<Value>) -> Result<bool, CatalogError> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(DbBackend::MySql, sql, values))
            .await
            .map_err(query_error)?
            .ok_or_else(|| CatalogError::Query("count query returned no row".to_string()))?;

        let n: i64 = row.try_get("", "n").map_err(query_error)?;
        Ok(n > 0)
    }
}

fn query_error(err: DbErr) -> CatalogError {
    CatalogError::Query(err.to_string())
}

#[async_trait]
impl CatalogIntrospector for MySqlCatalog {
    async fn schema_exists(&self, schema: &str) -> Result<bool, CatalogError> {
        self.count(SCHEMA_EXISTS_SQL, vec![schema.into()]).await
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, CatalogError> {
        self.count(TABLE_EXISTS_SQL, vec![schema.into(), table.into()])
            .await
    }

    async fn column_exists(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, CatalogError> {
        self.count(
            COLUMN_EXISTS_SQL,
            vec![schema.into(), table.into(), column.into()],
        )
        .await
    }

    async fn foreign_key_exists(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, CatalogError> {
        self.count(
            FOREIGN_KEY_EXISTS_SQL,
            vec![schema.into(), table.into(), column.into()],
        )
        .await
    }

    async fn foreign_key_constraint(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        referenced_table: &str,
    ) -> Result<Option<String>, CatalogError> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::MySql,
                FOREIGN_KEY_NAME_SQL,
                [
                    schema.into(),
                    table.into(),
                    column.into(),
                    referenced_table.into(),
                ],
            ))
            .await
            .map_err(query_error)?;

        row.map(|r| r.try_get::<String>("", "name"))
            .transpose()
            .map_err(query_error)
    }
}

#[async_trait]
impl DdlExecutor for MySqlCatalog {
    async fn execute_ddl(&self, statement: &DdlStatement) -> Result<(), CatalogError> {
        let sql = statement.sql();
        debug!(schema = statement.schema(), %sql, "Executing DDL");

        // DDL reports no meaningful row count; success is the absence of an error.
        self.db
            .execute_unprepared(&sql)
            .await
            .map(|_| ())
            .map_err(|e| CatalogError::Statement(e.to_string()))
    }
}
