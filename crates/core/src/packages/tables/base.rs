//! Always-on tables every business starts with.

use std::sync::LazyLock;

use super::{created_at, id};
use crate::schema::{ColumnDef, PendingColumn, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("roles")
            .column(id())
            .column(ColumnDef::new("name", "VARCHAR(64)").not_null())
            .column(ColumnDef::new("privileges", "TEXT"))
            .column(created_at()),
        TableDescriptor::new("employees")
            .column(id())
            .column(ColumnDef::new("role_id", "INT"))
            .column(ColumnDef::new("full_name", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("email", "VARCHAR(255)"))
            .column(ColumnDef::new("phone", "VARCHAR(32)"))
            .column(ColumnDef::new("joined_on", "DATE"))
            .column(created_at())
            .pending_column(PendingColumn::add("designation", "VARCHAR(128)").after("full_name"))
            .pending_column(PendingColumn::drop("legacy_code"))
            .pending_foreign_key(PendingForeignKey::add("role_id", "roles", "id")),
        TableDescriptor::new("business_settings")
            .column(id())
            .column(ColumnDef::new("setting_key", "VARCHAR(128)").not_null())
            .column(ColumnDef::new("setting_value", "TEXT"))
            .column(
                ColumnDef::new(
                    "updated_at",
                    "DATETIME DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP",
                )
                .not_null(),
            ),
    ]
});
