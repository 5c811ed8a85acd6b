//! Lightweight bookkeeping.

use std::sync::LazyLock;

use super::{created_at, id};
use crate::schema::{ColumnDef, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("account_ledgers")
            .column(id())
            .column(ColumnDef::new("name", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("ledger_type", "VARCHAR(32)").not_null())
            .column(ColumnDef::new("opening_balance", "DECIMAL(14,2) DEFAULT 0").not_null())
            .column(created_at()),
        TableDescriptor::new("account_vouchers")
            .column(id())
            .column(ColumnDef::new("voucher_no", "VARCHAR(32)").not_null())
            .column(ColumnDef::new("voucher_date", "DATE").not_null())
            .column(ColumnDef::new("narration", "TEXT"))
            .column(ColumnDef::new("created_by", "INT"))
            .column(created_at())
            .pending_foreign_key(PendingForeignKey::add("created_by", "employees", "id")),
        TableDescriptor::new("account_voucher_lines")
            .column(id())
            .column(ColumnDef::new("voucher_id", "INT").not_null())
            .column(ColumnDef::new("ledger_id", "INT").not_null())
            .column(ColumnDef::new("debit", "DECIMAL(14,2) DEFAULT 0").not_null())
            .column(ColumnDef::new("credit", "DECIMAL(14,2) DEFAULT 0").not_null())
            .pending_foreign_key(PendingForeignKey::add("voucher_id", "account_vouchers", "id"))
            .pending_foreign_key(PendingForeignKey::add("ledger_id", "account_ledgers", "id")),
    ]
});
