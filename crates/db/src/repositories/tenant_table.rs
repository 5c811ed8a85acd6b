//! Generic repository for tenant tables.
//!
//! One type serves every tenant table: the descriptor supplies the table
//! name, the valid columns and the key, and rows travel as JSON objects.

use bizhub_core::packages::find_table;
use bizhub_core::schema::{DmlError, TableDescriptor, dml};
use bizhub_core::tenant::TenantSchema;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement, Value,
};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Tenant table repository errors.
#[derive(Debug, Error)]
pub enum TenantTableError {
    /// No package defines the table.
    #[error("Unknown tenant table: {0}")]
    UnknownTable(String),

    /// The requested columns do not fit the descriptor.
    #[error(transparent)]
    Dml(#[from] DmlError),

    /// A row value cannot be bound.
    #[error("Unsupported value for column {0}")]
    UnsupportedValue(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// CRUD access to one table inside one tenant schema.
#[derive(Debug, Clone)]
pub struct TenantTableRepository {
    db: DatabaseConnection,
    schema: TenantSchema,
    descriptor: &'static TableDescriptor,
}

fn bind(column: &str, value: &JsonValue) -> Result<Value, TenantTableError> {
    Ok(match value {
        JsonValue::Null => Value::String(None),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else if let Some(f) = n.as_f64() {
                f.into()
            } else {
                return Err(TenantTableError::UnsupportedValue(column.to_string()));
            }
        }
        JsonValue::String(s) => s.clone().into(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string().into(),
    })
}

impl TenantTableRepository {
    /// Creates a repository for `descriptor` in `schema`.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        schema: TenantSchema,
        descriptor: &'static TableDescriptor,
    ) -> Self {
        Self {
            db,
            schema,
            descriptor,
        }
    }

    /// Creates a repository for a table looked up by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no package defines `table`.
    pub fn for_table(
        db: DatabaseConnection,
        schema: TenantSchema,
        table: &str,
    ) -> Result<Self, TenantTableError> {
        let (_, descriptor) =
            find_table(table).ok_or_else(|| TenantTableError::UnknownTable(table.to_string()))?;
        Ok(Self::new(db, schema, descriptor))
    }

    fn statement(sql: String, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::MySql, sql, values)
    }

    fn split(
        values: &Map<String, JsonValue>,
    ) -> Result<(Vec<&str>, Vec<Value>), TenantTableError> {
        let mut columns = Vec::with_capacity(values.len());
        let mut bound = Vec::with_capacity(values.len());
        for (column, value) in values {
            columns.push(column.as_str());
            bound.push(bind(column, value)?);
        }
        Ok((columns, bound))
    }

    /// Inserts a row and returns the generated key.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown columns or a failed insert.
    pub async fn insert(&self, values: &Map<String, JsonValue>) -> Result<u64, TenantTableError> {
        let (columns, bound) = Self::split(values)?;
        let sql = dml::insert_statement(self.schema.as_str(), self.descriptor, &columns)?;
        let result = self.db.execute(Self::statement(sql, bound)).await?;
        Ok(result.last_insert_id())
    }

    /// Finds a row by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_key(&self, key: i64) -> Result<Option<JsonValue>, TenantTableError> {
        let sql = dml::select_by_key_statement(self.schema.as_str(), self.descriptor)?;
        Ok(JsonValue::find_by_statement(Self::statement(sql, vec![key.into()]))
            .one(&self.db)
            .await?)
    }

    /// Updates the given columns of a row. Returns whether a row matched.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown columns or a failed update.
    pub async fn update_by_key(
        &self,
        key: i64,
        values: &Map<String, JsonValue>,
    ) -> Result<bool, TenantTableError> {
        let (columns, mut bound) = Self::split(values)?;
        let sql = dml::update_by_key_statement(self.schema.as_str(), self.descriptor, &columns)?;
        bound.push(key.into());
        let result = self.db.execute(Self::statement(sql, bound)).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a row. Returns whether a row matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_by_key(&self, key: i64) -> Result<bool, TenantTableError> {
        let sql = dml::delete_by_key_statement(self.schema.as_str(), self.descriptor)?;
        let result = self
            .db
            .execute(Self::statement(sql, vec![key.into()]))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lists rows in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<JsonValue>, TenantTableError> {
        let sql = dml::list_statement(self.schema.as_str(), self.descriptor)?;
        Ok(
            JsonValue::find_by_statement(Self::statement(sql, vec![limit.into(), offset.into()]))
                .all(&self.db)
                .await?,
        )
    }
}
