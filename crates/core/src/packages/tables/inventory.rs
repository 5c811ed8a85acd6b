//! Stock keeping.

use std::sync::LazyLock;

use super::{created_at, id};
use crate::schema::{ColumnDef, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("inventory_categories")
            .column(id())
            .column(ColumnDef::new("name", "VARCHAR(128)").not_null())
            .column(ColumnDef::new("parent_id", "INT"))
            .pending_foreign_key(PendingForeignKey::add("parent_id", "inventory_categories", "id")),
        TableDescriptor::new("inventory_items")
            .column(id())
            .column(ColumnDef::new("category_id", "INT"))
            .column(ColumnDef::new("sku", "VARCHAR(64)").not_null())
            .column(ColumnDef::new("name", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("unit", "VARCHAR(16)"))
            .column(ColumnDef::new("unit_price", "DECIMAL(12,2)").not_null())
            .column(ColumnDef::new("reorder_level", "INT"))
            .column(created_at())
            .pending_foreign_key(PendingForeignKey::add("category_id", "inventory_categories", "id")),
        TableDescriptor::new("inventory_stock_movements")
            .column(id())
            .column(ColumnDef::new("item_id", "INT").not_null())
            .column(ColumnDef::new("quantity", "DECIMAL(12,3)").not_null())
            .column(ColumnDef::new("movement_type", "VARCHAR(16)").not_null())
            .column(ColumnDef::new("reference", "VARCHAR(64)"))
            .column(ColumnDef::new("moved_at", "DATETIME DEFAULT CURRENT_TIMESTAMP").not_null())
            .pending_foreign_key(PendingForeignKey::add("item_id", "inventory_items", "id")),
    ]
});
