//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the control database
//! - Repositories implementing the core provisioning traits
//! - The MySQL catalog used to introspect and alter tenant schemas
//! - Database migrations

pub mod catalog;
pub mod entities;
pub mod migration;
pub mod repositories;
pub mod service;

pub use catalog::MySqlCatalog;
pub use repositories::{BusinessRepository, PurchaseRepository, TenantTableRepository};
pub use service::{ProvisioningService, ProvisioningServiceError, PurchaseOutcome};

use std::time::Duration;

use bizhub_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options).await
}
