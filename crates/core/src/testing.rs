//! In-memory doubles for the storage seams.
//!
//! `MemoryCatalog` keeps a map of schemas, tables, columns and foreign keys
//! and applies [`DdlStatement`]s structurally, enforcing the same
//! preconditions MySQL does (no duplicate objects, foreign keys need the
//! column and the referenced column, `AFTER` needs its anchor).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bizhub_shared::types::{BusinessId, PurchaseId};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::entitlement::{EntitlementError, PurchaseRecord, PurchaseSource};
use crate::provisioning::{
    CatalogError, CatalogIntrospector, DdlExecutor, ProvisionError, TenantDirectory,
};
use crate::schema::DdlStatement;
use crate::tenant::Tenant;

/// Builds a tenant with the default prefix.
pub fn tenant(code: &str) -> Tenant {
    Tenant::new(BusinessId::new(), code, "biz_").unwrap()
}

/// Builds a purchase record for `tenant` ending at `until`.
pub fn purchase(
    tenant: &Tenant,
    features: &str,
    tables: &str,
    until: DateTime<Utc>,
) -> PurchaseRecord {
    PurchaseRecord {
        id: PurchaseId::new(),
        business_id: tenant.business_id,
        package_id: "pkg-test".into(),
        feature_names: features.into(),
        granted_table_names: tables.into(),
        active_from: until - ChronoDuration::days(30),
        active_until: until,
    }
}

#[derive(Debug, Clone)]
struct ForeignKey {
    name: String,
    column: String,
    referenced_table: String,
}

#[derive(Debug, Default)]
struct Table {
    columns: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
    fk_counter: usize,
}

#[derive(Debug, Default)]
struct State {
    schemas: BTreeMap<String, BTreeMap<String, Table>>,
    executed: Vec<String>,
    failing_queries: Vec<String>,
    failing_statements: Vec<String>,
    delays: HashMap<String, Duration>,
    in_flight: HashMap<String, usize>,
    max_in_flight: HashMap<String, usize>,
    total_in_flight: usize,
    max_total_in_flight: usize,
}

impl State {
    fn table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.schemas.get(schema)?.get(table)
    }

    fn table_mut(&mut self, schema: &str, table: &str) -> Result<&mut Table, CatalogError> {
        self.schemas
            .get_mut(schema)
            .and_then(|tables| tables.get_mut(table))
            .ok_or_else(|| CatalogError::Statement(format!("Table '{schema}.{table}' doesn't exist")))
    }

    fn check_query(&self, key: &str) -> Result<(), CatalogError> {
        if self.failing_queries.iter().any(|p| key.contains(p.as_str())) {
            return Err(CatalogError::Query(format!("injected failure for {key}")));
        }
        Ok(())
    }

    fn apply(&mut self, statement: &DdlStatement) -> Result<(), CatalogError> {
        let sql = statement.sql();
        if self.failing_statements.iter().any(|p| sql.contains(p.as_str())) {
            return Err(CatalogError::Statement(format!("injected failure: {sql}")));
        }

        match statement {
            DdlStatement::CreateSchema { schema } => {
                if self.schemas.contains_key(schema) {
                    return Err(CatalogError::Statement(format!(
                        "Can't create database '{schema}'; database exists"
                    )));
                }
                self.schemas.insert(schema.clone(), BTreeMap::new());
            }
            DdlStatement::CreateTable { schema, descriptor } => {
                let tables = self.schemas.get_mut(schema).ok_or_else(|| {
                    CatalogError::Statement(format!("Unknown database '{schema}'"))
                })?;
                if tables.contains_key(&descriptor.name) {
                    return Err(CatalogError::Statement(format!(
                        "Table '{}' already exists",
                        descriptor.name
                    )));
                }
                tables.insert(
                    descriptor.name.clone(),
                    Table {
                        columns: descriptor.columns.iter().map(|c| c.name.clone()).collect(),
                        ..Table::default()
                    },
                );
            }
            DdlStatement::AddColumn {
                schema,
                table,
                column,
                insert_after,
                ..
            } => {
                let target = self.table_mut(schema, table)?;
                if target.columns.contains(column) {
                    return Err(CatalogError::Statement(format!(
                        "Duplicate column name '{column}'"
                    )));
                }
                let position = match insert_after {
                    Some(after) => {
                        target.columns.iter().position(|c| c == after).ok_or_else(|| {
                            CatalogError::Statement(format!("Unknown column '{after}'"))
                        })? + 1
                    }
                    None => target.columns.len(),
                };
                target.columns.insert(position, column.clone());
            }
            DdlStatement::DropColumn {
                schema,
                table,
                column,
            } => {
                let target = self.table_mut(schema, table)?;
                let position = target.columns.iter().position(|c| c == column).ok_or_else(
                    || CatalogError::Statement(format!("Can't DROP '{column}'; check that it exists")),
                )?;
                target.columns.remove(position);
            }
            DdlStatement::AddForeignKey {
                schema,
                table,
                column,
                referenced_table,
                referenced_column,
            } => {
                let referenced_ok = self
                    .table(schema, referenced_table)
                    .is_some_and(|t| t.columns.contains(referenced_column));
                let target = self.table_mut(schema, table)?;
                if !target.columns.contains(column) {
                    return Err(CatalogError::Statement(format!(
                        "Key column '{column}' doesn't exist in table"
                    )));
                }
                if !referenced_ok {
                    return Err(CatalogError::Statement(format!(
                        "Failed to open the referenced table '{referenced_table}'"
                    )));
                }
                target.fk_counter += 1;
                let name = format!("{table}_ibfk_{}", target.fk_counter);
                target.foreign_keys.push(ForeignKey {
                    name,
                    column: column.clone(),
                    referenced_table: referenced_table.clone(),
                });
            }
            DdlStatement::DropForeignKey {
                schema,
                table,
                constraint,
            } => {
                let target = self.table_mut(schema, table)?;
                let position = target
                    .foreign_keys
                    .iter()
                    .position(|fk| &fk.name == constraint)
                    .ok_or_else(|| {
                        CatalogError::Statement(format!("Can't DROP '{constraint}'"))
                    })?;
                target.foreign_keys.remove(position);
            }
        }

        self.executed.push(sql);
        Ok(())
    }
}

/// Catalog double backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Runs `f` against the state, counting the call as in flight for
    /// `schema` and sleeping first when a delay is configured.
    async fn call<T>(&self, schema: &str, f: impl FnOnce(&mut State) -> T) -> T {
        let delay = {
            let mut state = self.state();
            let in_flight = state.in_flight.entry(schema.to_string()).or_default();
            *in_flight += 1;
            let current = *in_flight;
            let max = state.max_in_flight.entry(schema.to_string()).or_default();
            *max = (*max).max(current);
            state.total_in_flight += 1;
            state.max_total_in_flight = state.max_total_in_flight.max(state.total_in_flight);
            state.delays.get(schema).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let out = f(&mut state);
        if let Some(in_flight) = state.in_flight.get_mut(schema) {
            *in_flight -= 1;
        }
        state.total_in_flight -= 1;
        out
    }

    /// Creates `schema` (if needed) and a table with the given columns,
    /// without recording a statement.
    pub fn seed_table(&self, schema: &str, table: &str, columns: &[&str]) {
        self.state().schemas.entry(schema.to_string()).or_default().insert(
            table.to_string(),
            Table {
                columns: columns.iter().map(ToString::to_string).collect(),
                ..Table::default()
            },
        );
    }

    /// Makes every metadata query whose key contains `pattern` fail.
    /// Keys look like `schema s`, `table t`, `column t.c`, `foreign key t.c`.
    pub fn fail_queries_matching(&self, pattern: &str) {
        self.state().failing_queries.push(pattern.to_string());
    }

    /// Makes every statement whose SQL contains `pattern` fail.
    pub fn fail_statements_matching(&self, pattern: &str) {
        self.state().failing_statements.push(pattern.to_string());
    }

    /// Delays every call against `schema`.
    pub fn set_delay_for(&self, schema: &str, delay: Duration) {
        self.state().delays.insert(schema.to_string(), delay);
    }

    /// SQL of every statement that succeeded, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn has_schema(&self, schema: &str) -> bool {
        self.state().schemas.contains_key(schema)
    }

    pub fn has_table(&self, schema: &str, table: &str) -> bool {
        self.state().table(schema, table).is_some()
    }

    pub fn has_column(&self, schema: &str, table: &str, column: &str) -> bool {
        self.state()
            .table(schema, table)
            .is_some_and(|t| t.columns.iter().any(|c| c == column))
    }

    pub fn has_foreign_key(&self, schema: &str, table: &str, column: &str) -> bool {
        self.state()
            .table(schema, table)
            .is_some_and(|t| t.foreign_keys.iter().any(|fk| fk.column == column))
    }

    /// Column names of a table in position order.
    pub fn columns(&self, schema: &str, table: &str) -> Vec<String> {
        self.state()
            .table(schema, table)
            .map(|t| t.columns.clone())
            .unwrap_or_default()
    }

    /// Highest number of simultaneous calls seen against `schema`.
    pub fn max_overlap(&self, schema: &str) -> usize {
        self.state().max_in_flight.get(schema).copied().unwrap_or_default()
    }

    /// Highest number of simultaneous calls seen across all schemas.
    pub fn max_total_overlap(&self) -> usize {
        self.state().max_total_in_flight
    }
}

#[async_trait]
impl CatalogIntrospector for MemoryCatalog {
    async fn schema_exists(&self, schema: &str) -> Result<bool, CatalogError> {
        self.call(schema, |state| {
            state.check_query(&format!("schema {schema}"))?;
            Ok(state.schemas.contains_key(schema))
        })
        .await
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, CatalogError> {
        self.call(schema, |state| {
            state.check_query(&format!("table {table}"))?;
            Ok(state.table(schema, table).is_some())
        })
        .await
    }

    async fn column_exists(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, CatalogError> {
        self.call(schema, |state| {
            state.check_query(&format!("column {table}.{column}"))?;
            Ok(state
                .table(schema, table)
                .is_some_and(|t| t.columns.iter().any(|c| c == column)))
        })
        .await
    }

    async fn foreign_key_exists(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<bool, CatalogError> {
        self.call(schema, |state| {
            state.check_query(&format!("foreign key {table}.{column}"))?;
            Ok(state
                .table(schema, table)
                .is_some_and(|t| t.foreign_keys.iter().any(|fk| fk.column == column)))
        })
        .await
    }

    async fn foreign_key_constraint(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        referenced_table: &str,
    ) -> Result<Option<String>, CatalogError> {
        self.call(schema, |state| {
            state.check_query(&format!("foreign key {table}.{column}"))?;
            Ok(state.table(schema, table).and_then(|t| {
                t.foreign_keys
                    .iter()
                    .find(|fk| fk.column == column && fk.referenced_table == referenced_table)
                    .map(|fk| fk.name.clone())
            }))
        })
        .await
    }
}

#[async_trait]
impl DdlExecutor for MemoryCatalog {
    async fn execute_ddl(&self, statement: &DdlStatement) -> Result<(), CatalogError> {
        self.call(statement.schema(), |state| state.apply(statement))
            .await
    }
}

/// Purchase source over a fixed record list.
#[derive(Debug, Default)]
pub struct MemoryPurchases {
    records: Vec<PurchaseRecord>,
    failing: HashSet<BusinessId>,
}

impl MemoryPurchases {
    pub fn new(records: Vec<PurchaseRecord>) -> Self {
        Self {
            records,
            failing: HashSet::new(),
        }
    }

    /// Makes lookups for `business_id` fail with a storage error.
    #[must_use]
    pub fn failing_for(mut self, business_id: BusinessId) -> Self {
        self.failing.insert(business_id);
        self
    }
}

#[async_trait]
impl PurchaseSource for MemoryPurchases {
    async fn active_purchases(
        &self,
        business_id: BusinessId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PurchaseRecord>, EntitlementError> {
        if self.failing.contains(&business_id) {
            return Err(EntitlementError::Storage("connection reset".into()));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.business_id == business_id && r.is_active_at(as_of))
            .cloned()
            .collect())
    }
}

/// Tenant directory over a fixed list.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    tenants: Vec<Tenant>,
    fail: bool,
}

impl MemoryDirectory {
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self {
            tenants,
            fail: false,
        }
    }

    /// A directory whose listing always fails.
    pub fn failing() -> Self {
        Self {
            tenants: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl TenantDirectory for MemoryDirectory {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ProvisionError> {
        if self.fail {
            return Err(ProvisionError::TenantDirectory("directory offline".into()));
        }
        Ok(self.tenants.clone())
    }

    async fn find_tenant(&self, code: &str) -> Result<Option<Tenant>, ProvisionError> {
        Ok(self.tenants.iter().find(|t| t.code == code).cloned())
    }
}
