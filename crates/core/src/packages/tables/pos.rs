//! Point of sale.

use std::sync::LazyLock;

use super::id;
use crate::schema::{ColumnDef, PendingForeignKey, TableDescriptor};

pub(crate) static TABLES: LazyLock<Vec<TableDescriptor>> = LazyLock::new(|| {
    vec![
        TableDescriptor::new("pos_registers")
            .column(id())
            .column(ColumnDef::new("name", "VARCHAR(64)").not_null())
            .column(ColumnDef::new("location", "VARCHAR(255)"))
            .column(ColumnDef::new("is_open", "TINYINT(1) DEFAULT 0").not_null()),
        TableDescriptor::new("pos_sales")
            .column(id())
            .column(ColumnDef::new("register_id", "INT").not_null())
            .column(ColumnDef::new("cashier_id", "INT"))
            .column(ColumnDef::new("customer_name", "VARCHAR(255)"))
            .column(ColumnDef::new("total", "DECIMAL(12,2)").not_null())
            .column(ColumnDef::new("paid", "DECIMAL(12,2)"))
            .column(ColumnDef::new("sold_at", "DATETIME DEFAULT CURRENT_TIMESTAMP").not_null())
            .pending_foreign_key(PendingForeignKey::add("register_id", "pos_registers", "id"))
            .pending_foreign_key(PendingForeignKey::add("cashier_id", "employees", "id")),
        // Sale items used to reference inventory directly; POS no longer requires Inventory.
        TableDescriptor::new("pos_sale_items")
            .column(id())
            .column(ColumnDef::new("sale_id", "INT").not_null())
            .column(ColumnDef::new("item_id", "INT"))
            .column(ColumnDef::new("item_name", "VARCHAR(255)").not_null())
            .column(ColumnDef::new("quantity", "DECIMAL(12,3)").not_null())
            .column(ColumnDef::new("unit_price", "DECIMAL(12,2)").not_null())
            .pending_foreign_key(PendingForeignKey::add("sale_id", "pos_sales", "id"))
            .pending_foreign_key(PendingForeignKey::drop("item_id", "inventory_items", "id")),
    ]
});
