//! Customer relationship management.

use std::sync::LazyLock;

use super::{created_at, id};
use crate::schema::{ColumnDef, PendingColumn, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("crm_customers")
            .column(id())
            .column(ColumnDef::new("name", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("email", "VARCHAR(255)"))
            .column(ColumnDef::new("phone", "VARCHAR(32)"))
            .column(ColumnDef::new("address", "TEXT"))
            .column(ColumnDef::new("description", "TEXT"))
            .column(created_at())
            .pending_column(PendingColumn::add("loyalty_tier", "VARCHAR(32)").after("description")),
        TableDescriptor::new("crm_leads")
            .column(id())
            .column(ColumnDef::new("customer_id", "INT"))
            .column(ColumnDef::new("title", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("description", "TEXT"))
            .column(ColumnDef::new("status", "VARCHAR(32)").not_null())
            .column(ColumnDef::new("assigned_to", "INT"))
            .column(created_at())
            .pending_column(PendingColumn::add("source", "VARCHAR(64)").after("description"))
            .pending_foreign_key(PendingForeignKey::add("customer_id", "crm_customers", "id"))
            .pending_foreign_key(PendingForeignKey::add("assigned_to", "employees", "id")),
        TableDescriptor::new("crm_interactions")
            .column(id())
            .column(ColumnDef::new("customer_id", "INT").not_null())
            .column(ColumnDef::new("employee_id", "INT"))
            .column(ColumnDef::new("channel", "VARCHAR(32)"))
            .column(ColumnDef::new("notes", "TEXT"))
            .column(ColumnDef::new("happened_at", "DATETIME").not_null())
            .pending_foreign_key(PendingForeignKey::add("customer_id", "crm_customers", "id"))
            .pending_foreign_key(PendingForeignKey::add("employee_id", "employees", "id")),
    ]
});
