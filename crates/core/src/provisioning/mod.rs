//! Tenant schema provisioning.
//!
//! # Modules
//!
//! - `catalog` - Existence checks and DDL execution seams
//! - `error` - Provisioning error taxonomy
//! - `report` - Per-step, per-tenant and per-batch outcomes
//! - `plan` - Descriptor set for a tenant's entitlements
//! - `orchestrator` - Three-pass check-then-act reconciliation
//! - `driver` - Batch and single-tenant runs with locking and deadlines

pub mod catalog;
pub mod driver;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod report;

#[cfg(test)]
mod orchestrator_props;

pub use catalog::{CatalogError, CatalogIntrospector, DdlExecutor};
pub use driver::{ProvisioningDriver, TenantDirectory, TenantLocks};
pub use error::ProvisionError;
pub use orchestrator::Provisioner;
pub use plan::ProvisioningSet;
pub use report::{Action, BatchReport, ProvisionReport, StepOutcome, StepStatus, TenantRun};
