//! Provisioning error types.
//!
//! Failures are recovered at the smallest scope that contains them. Only
//! schema-level failures, entitlement failures and timeouts end a tenant's
//! run; everything else is recorded against a single step.

use thiserror::Error;

use crate::entitlement::EntitlementError;

/// Errors that can occur while provisioning a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// The tenant schema could not be created. Ends the tenant's run.
    #[error("Failed to create schema {schema}: {reason}")]
    SchemaCreate {
        /// Tenant schema.
        schema: String,
        /// Store message.
        reason: String,
    },

    /// A table could not be created.
    #[error("Failed to create table {schema}.{table}: {reason}")]
    TableCreate {
        /// Tenant schema.
        schema: String,
        /// Table name.
        table: String,
        /// Store message.
        reason: String,
    },

    /// A column could not be added or dropped.
    #[error("Failed to reconcile column {table}.{column} in {schema}: {reason}")]
    ColumnReconcile {
        /// Tenant schema.
        schema: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Store message.
        reason: String,
    },

    /// A foreign key could not be added or dropped.
    #[error("Failed to reconcile foreign key on {table}.{column} in {schema}: {reason}")]
    ForeignKeyReconcile {
        /// Tenant schema.
        schema: String,
        /// Table name.
        table: String,
        /// Referencing column.
        column: String,
        /// Store message.
        reason: String,
    },

    /// An existence check failed, so the guarded action was not attempted.
    #[error("Metadata query for {target} in {schema} failed: {reason}")]
    MetadataQuery {
        /// Tenant schema.
        schema: String,
        /// What was being checked (`schema`, `table t`, `column t.c`, ...).
        target: String,
        /// Store message.
        reason: String,
    },

    /// The tenant's purchases could not be resolved.
    #[error("Could not resolve entitlements for {schema}: {source}")]
    Entitlement {
        /// Tenant schema.
        schema: String,
        /// Underlying failure.
        #[source]
        source: EntitlementError,
    },

    /// The tenant directory could not be listed.
    #[error("Tenant directory error: {0}")]
    TenantDirectory(String),

    /// More than one business code maps onto the same schema. None of them
    /// is provisioned until the codes are changed.
    #[error("Schema {schema} is shared by business codes {}", .codes.join(", "))]
    SchemaCollision {
        /// Shared schema.
        schema: String,
        /// Every code that maps onto it, sorted.
        codes: Vec<String>,
    },

    /// The tenant run did not finish before its deadline.
    #[error("Provisioning {schema} exceeded {seconds}s")]
    Timeout {
        /// Tenant schema.
        schema: String,
        /// Deadline that elapsed.
        seconds: u64,
    },
}

impl ProvisionError {
    /// Returns the error code for API responses and log filtering.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaCreate { .. } => "SCHEMA_CREATE_FAILED",
            Self::TableCreate { .. } => "TABLE_CREATE_FAILED",
            Self::ColumnReconcile { .. } => "COLUMN_RECONCILE_FAILED",
            Self::ForeignKeyReconcile { .. } => "FOREIGN_KEY_RECONCILE_FAILED",
            Self::MetadataQuery { .. } => "METADATA_QUERY_FAILED",
            Self::Entitlement { .. } => "ENTITLEMENT_RESOLUTION_FAILED",
            Self::TenantDirectory(_) => "TENANT_DIRECTORY_FAILED",
            Self::SchemaCollision { .. } => "SCHEMA_COLLISION",
            Self::Timeout { .. } => "TENANT_RUN_TIMEOUT",
        }
    }
}
