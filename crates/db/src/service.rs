//! Provisioning service wiring.
//!
//! Connects the core driver to MySQL: the catalog, the purchase ledger and
//! the business directory all share one connection pool.

use std::sync::Arc;

use bizhub_core::entitlement::PurchaseRecord;
use bizhub_core::provisioning::{
    BatchReport, ProvisionError, ProvisionReport, ProvisioningDriver, TenantDirectory,
};
use bizhub_core::tenant::{Tenant, schema_collisions};
use bizhub_shared::ProvisioningConfig;
use bizhub_shared::types::BusinessId;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::MySqlCatalog;
use crate::repositories::{BusinessDirectory, BusinessRepository, NewPurchase, PurchaseRepository};

/// Provisioning service errors.
#[derive(Debug, Error)]
pub enum ProvisioningServiceError {
    /// No active business has the code.
    #[error("Business not found: {0}")]
    BusinessNotFound(String),

    /// Purchase input is inconsistent.
    #[error("Invalid purchase: {0}")]
    InvalidPurchase(String),

    /// Business input cannot be registered.
    #[error("Invalid business: {0}")]
    InvalidBusiness(String),

    /// The code maps onto a schema another business already owns.
    #[error("Business code {code} maps onto schema {schema}, already used by {}", .existing.join(", "))]
    SchemaTaken {
        /// Requested code.
        code: String,
        /// Schema it derives.
        schema: String,
        /// Codes of the businesses already on that schema.
        existing: Vec<String>,
    },

    /// The run could not start or its schema step failed.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A recorded purchase and the provisioning triggered by it.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    /// The stored purchase.
    pub purchase: PurchaseRecord,
    /// Result of provisioning its grant. A failure here does not undo the
    /// purchase; the next batch run converges the tenant.
    pub provisioning: Result<ProvisionReport, ProvisionError>,
}

/// Records purchases and runs provisioning against the live database.
#[derive(Clone)]
pub struct ProvisioningService {
    driver: Arc<ProvisioningDriver<MySqlCatalog>>,
    directory: Arc<BusinessDirectory>,
    businesses: BusinessRepository,
    purchases: PurchaseRepository,
}

impl ProvisioningService {
    /// Wires the service over a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: ProvisioningConfig) -> Self {
        let directory = Arc::new(BusinessDirectory::new(db.clone(), &config.schema_prefix));
        let purchases = PurchaseRepository::new(db.clone());
        let driver = ProvisioningDriver::new(
            Arc::new(MySqlCatalog::new(db.clone())),
            Arc::new(purchases.clone()),
            Arc::clone(&directory) as Arc<dyn TenantDirectory>,
            config,
        );

        Self {
            driver: Arc::new(driver),
            directory,
            businesses: BusinessRepository::new(db),
            purchases,
        }
    }

    /// The underlying driver.
    #[must_use]
    pub fn driver(&self) -> &ProvisioningDriver<MySqlCatalog> {
        &self.driver
    }

    /// Registers a business after checking its schema is not already derived
    /// from another business's code, inactive businesses included.
    ///
    /// The schema itself is provisioned by the first purchase or run.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or code is unusable, the derived schema
    /// is taken or the business cannot be stored.
    pub async fn register_business(
        &self,
        name: &str,
        code: &str,
    ) -> Result<Tenant, ProvisioningServiceError> {
        let (name, code) = (name.trim(), code.trim());
        if name.is_empty() {
            return Err(ProvisioningServiceError::InvalidBusiness(
                "name is empty".to_string(),
            ));
        }
        let candidate = Tenant::new(BusinessId::new(), code, self.directory.schema_prefix())
            .map_err(|e| ProvisioningServiceError::InvalidBusiness(e.to_string()))?;

        let existing: Vec<Tenant> = self
            .businesses
            .list_all()
            .await?
            .iter()
            .filter_map(|business| self.directory.tenant_for(business).ok())
            .collect();
        if let Some(codes) =
            schema_collisions(existing.iter().chain([&candidate])).get(&candidate.schema)
        {
            return Err(ProvisioningServiceError::SchemaTaken {
                code: code.to_string(),
                schema: candidate.schema.to_string(),
                existing: codes.iter().filter(|c| *c != code).cloned().collect(),
            });
        }

        let business = self.businesses.create(name, code).await?;
        let tenant = self.directory.tenant_for(&business)?;
        info!(business = %tenant.code, schema = %tenant.schema, "Registered business");
        Ok(tenant)
    }

    /// Records a confirmed purchase and provisions what it grants right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the business is unknown, the package id is blank,
    /// the purchase window is inverted or the purchase cannot be stored. Provisioning failures are
    /// reported in the outcome instead.
    pub async fn record_purchase(
        &self,
        business_code: &str,
        input: &NewPurchase,
    ) -> Result<PurchaseOutcome, ProvisioningServiceError> {
        if input.package_id.trim().is_empty() {
            return Err(ProvisioningServiceError::InvalidPurchase(
                "package_id is empty".to_string(),
            ));
        }
        if input.active_until < input.active_from {
            return Err(ProvisioningServiceError::InvalidPurchase(
                "active_until is before active_from".to_string(),
            ));
        }

        let business = self
            .businesses
            .find_active_by_code(business_code)
            .await?
            .ok_or_else(|| ProvisioningServiceError::BusinessNotFound(business_code.to_string()))?;
        let tenant = self.directory.tenant_for(&business)?;

        let purchase = self.purchases.record(tenant.business_id, input).await?;
        info!(
            business = %tenant.code,
            purchase_id = %purchase.id,
            package_id = %purchase.package_id,
            "Recorded purchase"
        );

        let provisioning = self.driver.provision_purchase(&tenant, &purchase.grant()).await;
        if let Err(e) = &provisioning {
            warn!(
                business = %tenant.code,
                error = %e,
                "Post-purchase provisioning failed; the next batch run will retry"
            );
        }

        Ok(PurchaseOutcome {
            purchase,
            provisioning,
        })
    }

    /// Provisions every active business.
    ///
    /// # Errors
    ///
    /// Returns an error if the business directory cannot be read.
    pub async fn run_all(&self, as_of: DateTime<Utc>) -> Result<BatchReport, ProvisionError> {
        self.driver.run_for_all_tenants(as_of).await
    }

    /// Provisions one business by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the business is unknown or its run fails.
    pub async fn run_tenant(
        &self,
        business_code: &str,
        as_of: DateTime<Utc>,
    ) -> Result<ProvisionReport, ProvisioningServiceError> {
        self.driver
            .run_for_code(business_code, as_of)
            .await?
            .ok_or_else(|| ProvisioningServiceError::BusinessNotFound(business_code.to_string()))
    }
}
