//! Always-on application tables.

use std::sync::LazyLock;

use super::{created_at, id};
use crate::schema::{ColumnDef, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("notifications")
            .column(id())
            .column(ColumnDef::new("employee_id", "INT"))
            .column(ColumnDef::new("title", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("body", "TEXT"))
            .column(ColumnDef::new("is_read", "TINYINT(1) DEFAULT 0").not_null())
            .column(created_at())
            .pending_foreign_key(PendingForeignKey::add("employee_id", "employees", "id")),
        TableDescriptor::new("activity_logs")
            .column(id())
            .column(ColumnDef::new("employee_id", "INT"))
            .column(ColumnDef::new("action", "VARCHAR(128)").not_null())
            .column(ColumnDef::new("details", "TEXT"))
            .column(created_at())
            .pending_foreign_key(PendingForeignKey::add("employee_id", "employees", "id")),
        TableDescriptor::new("stored_files")
            .column(id())
            .column(ColumnDef::new("original_name", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("storage_path", "VARCHAR(512)").not_null())
            .column(ColumnDef::new("mime_type", "VARCHAR(128)"))
            .column(ColumnDef::new("size_bytes", "BIGINT"))
            .column(ColumnDef::new("uploaded_by", "INT"))
            .column(created_at())
            .pending_foreign_key(PendingForeignKey::add("uploaded_by", "employees", "id")),
    ]
});
