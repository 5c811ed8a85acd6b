//! Table descriptor registry, one module per feature package.

pub(crate) mod app_default;
pub(crate) mod base;
pub(crate) mod crm;
pub(crate) mod hr;
pub(crate) mod inventory;
pub(crate) mod mini_account;
pub(crate) mod pos;

use crate::schema::ColumnDef;

/// Surrogate key shared by every tenant table.
fn id() -> ColumnDef {
    ColumnDef::new("id", "INT AUTO_INCREMENT").primary_key().not_null()
}

fn created_at() -> ColumnDef {
    ColumnDef::new("created_at", "DATETIME DEFAULT CURRENT_TIMESTAMP").not_null()
}
