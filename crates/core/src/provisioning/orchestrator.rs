//! Migration orchestrator.
//!
//! One `provision` call walks a fixed sequence for a single tenant:
//! schema check, schema create when missing, then a create pass, a column
//! pass and a foreign-key pass over the full descriptor list. Every mutating
//! statement is preceded by exactly one existence check, and every call is
//! awaited before the next so later checks observe earlier statements.
//!
//! All tables are created before any column is altered, and all columns are
//! altered before any foreign key is touched. A foreign key can therefore
//! reference a table or column introduced by another descriptor in the same
//! run without the caller ordering descriptors by dependency.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::provisioning::catalog::{CatalogIntrospector, DdlExecutor};
use crate::provisioning::error::ProvisionError;
use crate::provisioning::report::{Action, ProvisionReport, StepOutcome, StepStatus};
use crate::schema::{AlterOp, DdlStatement, PendingColumn, PendingForeignKey, TableDescriptor};
use crate::tenant::Tenant;

/// Reconciles tenant schemas against table descriptors.
pub struct Provisioner<C: ?Sized> {
    catalog: Arc<C>,
}

impl<C: ?Sized> Clone for Provisioner<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C> Provisioner<C>
where
    C: CatalogIntrospector + DdlExecutor + ?Sized,
{
    /// Creates a provisioner over a shared catalog handle.
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Brings `tenant`'s schema in line with `descriptors`.
    ///
    /// Returns `Err` only when the schema itself cannot be confirmed or
    /// created. Table, column and foreign-key failures are recorded in the
    /// report and never abort the run.
    pub async fn provision(
        &self,
        tenant: &Tenant,
        descriptors: &[&TableDescriptor],
    ) -> Result<ProvisionReport, ProvisionError> {
        let schema = tenant.schema.as_str();
        let schema_created = self.ensure_schema(schema).await?;

        let mut run = Run {
            catalog: self.catalog.as_ref(),
            schema,
            steps: Vec::new(),
            unavailable: HashSet::new(),
        };

        for descriptor in descriptors {
            run.create_table(descriptor).await;
        }
        for descriptor in descriptors {
            for column in &descriptor.pending_columns {
                run.reconcile_column(&descriptor.name, column).await;
            }
        }
        for descriptor in descriptors {
            for foreign_key in &descriptor.pending_foreign_keys {
                run.reconcile_foreign_key(&descriptor.name, foreign_key).await;
            }
        }

        let report = ProvisionReport {
            schema: tenant.schema.clone(),
            schema_created,
            steps: run.steps,
            unknown_features: Vec::new(),
        };

        info!(
            schema,
            tables = descriptors.len(),
            applied = report.applied_count(),
            failures = report.failures().count(),
            "Provisioning run finished"
        );

        Ok(report)
    }

    async fn ensure_schema(&self, schema: &str) -> Result<bool, ProvisionError> {
        let exists = self
            .catalog
            .schema_exists(schema)
            .await
            .map_err(|e| ProvisionError::MetadataQuery {
                schema: schema.to_string(),
                target: "schema".to_string(),
                reason: e.to_string(),
            })?;

        if exists {
            debug!(schema, "Schema already exists");
            return Ok(false);
        }

        let statement = DdlStatement::CreateSchema {
            schema: schema.to_string(),
        };
        self.catalog.execute_ddl(&statement).await.map_err(|e| {
            warn!(schema, error = %e, "Schema creation failed");
            ProvisionError::SchemaCreate {
                schema: schema.to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(schema, "Created schema");
        Ok(true)
    }
}

/// State of one run. Tables whose create failed or whose existence is
/// unknown are `unavailable` and skip the later passes.
struct Run<'a, C: ?Sized> {
    catalog: &'a C,
    schema: &'a str,
    steps: Vec<StepOutcome>,
    unavailable: HashSet<String>,
}

impl<C> Run<'_, C>
where
    C: CatalogIntrospector + DdlExecutor + ?Sized,
{
    fn record(&mut self, table: &str, action: Action, status: StepStatus) {
        self.steps.push(StepOutcome {
            table: table.to_string(),
            action,
            status,
        });
    }

    fn metadata_error(&self, target: String, reason: impl ToString) -> ProvisionError {
        ProvisionError::MetadataQuery {
            schema: self.schema.to_string(),
            target,
            reason: reason.to_string(),
        }
    }

    async fn create_table(&mut self, descriptor: &TableDescriptor) {
        let schema = self.schema;
        let table = descriptor.name.as_str();

        let status = match self.catalog.table_exists(schema, table).await {
            Ok(true) => {
                debug!(schema, table, "Table already exists");
                StepStatus::AlreadySatisfied
            }
            Ok(false) => {
                let statement = DdlStatement::CreateTable {
                    schema: schema.to_string(),
                    descriptor: descriptor.clone(),
                };
                match self.catalog.execute_ddl(&statement).await {
                    Ok(()) => {
                        info!(schema, table, "Created table");
                        StepStatus::Applied
                    }
                    Err(e) => {
                        warn!(schema, table, error = %e, "Table creation failed");
                        self.unavailable.insert(table.to_string());
                        StepStatus::Failed(ProvisionError::TableCreate {
                            schema: schema.to_string(),
                            table: table.to_string(),
                            reason: e.to_string(),
                        })
                    }
                }
            }
            Err(e) => {
                warn!(schema, table, error = %e, "Table existence unknown");
                self.unavailable.insert(table.to_string());
                StepStatus::Failed(self.metadata_error(format!("table {table}"), e))
            }
        };

        self.record(table, Action::CreateTable, status);
    }

    async fn reconcile_column(&mut self, table: &str, column: &PendingColumn) {
        let schema = self.schema;
        let name = column.name.as_str();
        let action = match column.op {
            AlterOp::Add => Action::AddColumn(name.to_string()),
            AlterOp::Drop => Action::DropColumn(name.to_string()),
        };

        if self.unavailable.contains(table) {
            debug!(schema, table, column = name, "Skipping column on unavailable table");
            self.record(table, action, StepStatus::Skipped);
            return;
        }

        let exists = match self.catalog.column_exists(schema, table, name).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(schema, table, column = name, error = %e, "Column existence unknown");
                let status =
                    StepStatus::Failed(self.metadata_error(format!("column {table}.{name}"), e));
                self.record(table, action, status);
                return;
            }
        };

        let statement = match (column.op, exists) {
            (AlterOp::Add, false) => DdlStatement::AddColumn {
                schema: schema.to_string(),
                table: table.to_string(),
                column: name.to_string(),
                sql_type: column.sql_type.clone(),
                insert_after: column.insert_after.clone(),
            },
            (AlterOp::Drop, true) => DdlStatement::DropColumn {
                schema: schema.to_string(),
                table: table.to_string(),
                column: name.to_string(),
            },
            (op, _) => {
                debug!(schema, table, column = name, %op, "Column already reconciled");
                self.record(table, action, StepStatus::AlreadySatisfied);
                return;
            }
        };

        let status = match self.catalog.execute_ddl(&statement).await {
            Ok(()) => {
                info!(schema, table, column = name, op = %column.op, "Reconciled column");
                StepStatus::Applied
            }
            Err(e) => {
                warn!(
                    schema,
                    table,
                    column = name,
                    op = %column.op,
                    error = %e,
                    "Column reconcile failed"
                );
                StepStatus::Failed(ProvisionError::ColumnReconcile {
                    schema: schema.to_string(),
                    table: table.to_string(),
                    column: name.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        self.record(table, action, status);
    }

    async fn reconcile_foreign_key(&mut self, table: &str, foreign_key: &PendingForeignKey) {
        let schema = self.schema;
        let column = foreign_key.column.as_str();
        let action = match foreign_key.op {
            AlterOp::Add => Action::AddForeignKey(column.to_string()),
            AlterOp::Drop => Action::DropForeignKey(column.to_string()),
        };

        if self.unavailable.contains(table) {
            debug!(schema, table, column, "Skipping foreign key on unavailable table");
            self.record(table, action, StepStatus::Skipped);
            return;
        }

        let statement = match foreign_key.op {
            AlterOp::Add => match self.catalog.foreign_key_exists(schema, table, column).await {
                Ok(true) => None,
                Ok(false) => Some(DdlStatement::AddForeignKey {
                    schema: schema.to_string(),
                    table: table.to_string(),
                    column: column.to_string(),
                    referenced_table: foreign_key.referenced_table.clone(),
                    referenced_column: foreign_key.referenced_column.clone(),
                }),
                Err(e) => {
                    warn!(schema, table, column, error = %e, "Foreign key existence unknown");
                    let status = StepStatus::Failed(
                        self.metadata_error(format!("foreign key {table}.{column}"), e),
                    );
                    self.record(table, action, status);
                    return;
                }
            },
            AlterOp::Drop => match self
                .catalog
                .foreign_key_constraint(schema, table, column, &foreign_key.referenced_table)
                .await
            {
                Ok(constraint) => constraint.map(|constraint| DdlStatement::DropForeignKey {
                    schema: schema.to_string(),
                    table: table.to_string(),
                    constraint,
                }),
                Err(e) => {
                    warn!(
                        schema,
                        table,
                        column,
                        error = %e,
                        "Foreign key constraint lookup failed"
                    );
                    let status = StepStatus::Failed(
                        self.metadata_error(format!("foreign key {table}.{column}"), e),
                    );
                    self.record(table, action, status);
                    return;
                }
            },
        };

        let Some(statement) = statement else {
            debug!(schema, table, column, op = %foreign_key.op, "Foreign key already reconciled");
            self.record(table, action, StepStatus::AlreadySatisfied);
            return;
        };

        let status = match self.catalog.execute_ddl(&statement).await {
            Ok(()) => {
                match &statement {
                    DdlStatement::DropForeignKey { constraint, .. } => {
                        info!(schema, table, column, %constraint, "Dropped foreign key");
                    }
                    _ => info!(
                        schema,
                        table,
                        column,
                        referenced_table = %foreign_key.referenced_table,
                        "Added foreign key"
                    ),
                }
                StepStatus::Applied
            }
            Err(e) => {
                warn!(
                    schema,
                    table,
                    column,
                    op = %foreign_key.op,
                    error = %e,
                    "Foreign key reconcile failed"
                );
                StepStatus::Failed(ProvisionError::ForeignKeyReconcile {
                    schema: schema.to_string(),
                    table: table.to_string(),
                    column: column.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        self.record(table, action, status);
    }
}
