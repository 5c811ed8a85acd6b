//! Human resource management.

use std::sync::LazyLock;

use super::{created_at, id};
use crate::schema::{ColumnDef, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("hr_departments")
            .column(id())
            .column(ColumnDef::new("name", "VARCHAR(128)").not_null())
            .column(ColumnDef::new("head_id", "INT"))
            .column(created_at())
            .pending_foreign_key(PendingForeignKey::add("head_id", "employees", "id")),
        TableDescriptor::new("hr_attendance")
            .column(id())
            .column(ColumnDef::new("employee_id", "INT").not_null())
            .column(ColumnDef::new("work_date", "DATE").not_null())
            .column(ColumnDef::new("check_in", "DATETIME"))
            .column(ColumnDef::new("check_out", "DATETIME"))
            .pending_foreign_key(PendingForeignKey::add("employee_id", "employees", "id")),
        TableDescriptor::new("hr_leave_requests")
            .column(id())
            .column(ColumnDef::new("employee_id", "INT").not_null())
            .column(ColumnDef::new("leave_type", "VARCHAR(32)").not_null())
            .column(ColumnDef::new("starts_on", "DATE").not_null())
            .column(ColumnDef::new("ends_on", "DATE").not_null())
            .column(ColumnDef::new("status", "VARCHAR(16)").not_null())
            .column(ColumnDef::new("approved_by", "INT"))
            .pending_foreign_key(PendingForeignKey::add("employee_id", "employees", "id"))
            .pending_foreign_key(PendingForeignKey::add("approved_by", "employees", "id")),
        TableDescriptor::new("hr_payroll")
            .column(id())
            .column(ColumnDef::new("employee_id", "INT").not_null())
            .column(ColumnDef::new("period", "CHAR(7)").not_null())
            .column(ColumnDef::new("gross", "DECIMAL(12,2)").not_null())
            .column(ColumnDef::new("deductions", "DECIMAL(12,2) DEFAULT 0").not_null())
            .column(ColumnDef::new("net", "DECIMAL(12,2)").not_null())
            .column(ColumnDef::new("paid_on", "DATE"))
            .pending_foreign_key(PendingForeignKey::add("employee_id", "employees", "id")),
    ]
});
