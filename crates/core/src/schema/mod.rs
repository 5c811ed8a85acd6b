//! Table descriptors and the SQL generated from them.
//!
//! # Modules
//!
//! - `descriptor` - Declarative table definitions and pending alterations
//! - `ddl` - CREATE/ALTER text for the tenant provisioning passes
//! - `dml` - Keyed CRUD text for the generic tenant table repository

pub mod ddl;
pub mod descriptor;
pub mod dml;

pub use ddl::DdlStatement;
pub use descriptor::{AlterOp, ColumnDef, PendingColumn, PendingForeignKey, TableDescriptor};
pub use dml::DmlError;
