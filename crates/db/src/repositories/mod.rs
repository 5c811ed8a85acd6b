//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod business;
pub mod purchase;
pub mod tenant_table;

pub use business::{BusinessDirectory, BusinessRepository};
pub use purchase::{NewPurchase, PurchaseRepository};
pub use tenant_table::{TenantTableError, TenantTableRepository};
