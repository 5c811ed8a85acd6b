//! Core provisioning logic for Bizhub.
//!
//! This crate contains the tenant provisioning engine with ZERO web or
//! database dependencies. Storage is reached only through async traits
//! implemented by `bizhub-db`.
//!
//! # Modules
//!
//! - `schema` - Table descriptors and DDL/DML generation
//! - `packages` - Feature packages and their table catalogs
//! - `tenant` - Tenant identity and schema naming
//! - `entitlement` - Purchase resolution
//! - `provisioning` - Orchestrator and batch driver

pub mod entitlement;
pub mod packages;
pub mod provisioning;
pub mod schema;
pub mod tenant;

#[cfg(test)]
mod testing;

pub use entitlement::{Entitlements, PurchaseGrant, PurchaseRecord, PurchaseSource};
pub use packages::FeaturePackage;
pub use provisioning::{
    BatchReport, CatalogIntrospector, DdlExecutor, ProvisionError, ProvisionReport,
    ProvisioningDriver, TenantDirectory,
};
pub use tenant::{Tenant, TenantSchema};
