//! Batch tenant driver.
//!
//! Runs the orchestrator for every tenant, for one tenant, or for a single
//! freshly recorded purchase. Runs targeting the same schema are serialized
//! by a per-tenant lock; runs for different tenants proceed in parallel up
//! to `max_concurrent_tenants`. Each run carries its own deadline, and a
//! tenant that fails or times out never stops its siblings.

use std::sync::Arc;

use async_trait::async_trait;
use bizhub_shared::ProvisioningConfig;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{StreamExt, stream};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::entitlement::{PurchaseGrant, PurchaseSource, resolve_entitlements};
use crate::provisioning::catalog::{CatalogIntrospector, DdlExecutor};
use crate::provisioning::error::ProvisionError;
use crate::provisioning::orchestrator::Provisioner;
use crate::provisioning::plan::ProvisioningSet;
use crate::provisioning::report::{BatchReport, ProvisionReport, TenantRun};
use crate::tenant::{Tenant, TenantSchema, schema_collisions};

/// Enumerates the tenants a batch run covers.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Every active tenant, in a stable order.
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ProvisionError>;

    /// The tenant with the given business code, if it is active.
    async fn find_tenant(&self, code: &str) -> Result<Option<Tenant>, ProvisionError>;
}

/// One async mutex per tenant schema.
#[derive(Debug, Default)]
pub struct TenantLocks {
    locks: DashMap<TenantSchema, Arc<Mutex<()>>>,
}

impl TenantLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `schema`.
    pub async fn acquire(&self, schema: &TenantSchema) -> OwnedMutexGuard<()> {
        // Clone out of the map so no shard guard is held across the await.
        let lock = Arc::clone(self.locks.entry(schema.clone()).or_default().value());
        lock.lock_owned().await
    }

    /// Whether a run currently holds `schema`.
    #[must_use]
    pub fn is_locked(&self, schema: &TenantSchema) -> bool {
        self.locks
            .get(schema)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}

/// Drives provisioning runs across tenants.
pub struct ProvisioningDriver<C: ?Sized> {
    provisioner: Provisioner<C>,
    purchases: Arc<dyn PurchaseSource>,
    tenants: Arc<dyn TenantDirectory>,
    locks: TenantLocks,
    config: ProvisioningConfig,
}

impl<C> ProvisioningDriver<C>
where
    C: CatalogIntrospector + DdlExecutor + ?Sized,
{
    /// Creates a driver. All collaborators are injected.
    pub fn new(
        catalog: Arc<C>,
        purchases: Arc<dyn PurchaseSource>,
        tenants: Arc<dyn TenantDirectory>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            provisioner: Provisioner::new(catalog),
            purchases,
            tenants,
            locks: TenantLocks::new(),
            config,
        }
    }

    /// Provisioning configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    /// Per-tenant locks held by this driver.
    #[must_use]
    pub const fn locks(&self) -> &TenantLocks {
        &self.locks
    }

    /// Provisions every tenant in the directory.
    ///
    /// Fails only when the directory itself cannot be listed. Per-tenant
    /// outcomes, timeouts included, are returned in directory order.
    /// Tenants whose codes map onto a shared schema are failed without
    /// touching the store.
    pub async fn run_for_all_tenants(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<BatchReport, ProvisionError> {
        let tenants = self.tenants.list_tenants().await?;
        let collisions = &schema_collisions(&tenants);
        let concurrency = self.config.max_concurrent_tenants.max(1);

        info!(
            tenants = tenants.len(),
            collisions = collisions.len(),
            concurrency,
            %as_of,
            "Starting provisioning batch"
        );

        let runs: Vec<TenantRun> = stream::iter(tenants)
            .map(|tenant| async move {
                let result = match collisions.get(&tenant.schema) {
                    Some(codes) => Err(collision(&tenant, codes)),
                    None => self.run_for_tenant(&tenant, as_of).await,
                };
                TenantRun { tenant, result }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let batch = BatchReport { runs };
        info!(
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            "Provisioning batch finished"
        );

        Ok(batch)
    }

    /// Resolves `tenant`'s active purchases at `as_of` and provisions them.
    pub async fn run_for_tenant(
        &self,
        tenant: &Tenant,
        as_of: DateTime<Utc>,
    ) -> Result<ProvisionReport, ProvisionError> {
        self.guarded(tenant, async {
            let entitlements =
                resolve_entitlements(self.purchases.as_ref(), tenant.business_id, as_of)
                    .await
                    .map_err(|source| ProvisionError::Entitlement {
                        schema: tenant.schema.to_string(),
                        source,
                    })?;
            let set = ProvisioningSet::from_entitlements(&entitlements);
            self.provision_set(tenant, &set).await
        })
        .await
    }

    /// Provisions what a single purchase grants, without re-resolving the
    /// tenant's other purchases. Used right after a purchase is recorded.
    pub async fn provision_purchase(
        &self,
        tenant: &Tenant,
        grant: &PurchaseGrant,
    ) -> Result<ProvisionReport, ProvisionError> {
        self.ensure_exclusive_schema(tenant).await?;
        self.guarded(tenant, async {
            let set = ProvisioningSet::from_grant(grant);
            self.provision_set(tenant, &set).await
        })
        .await
    }

    /// Looks a tenant up by business code and provisions it.
    pub async fn run_for_code(
        &self,
        code: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<ProvisionReport>, ProvisionError> {
        match self.tenants.find_tenant(code).await? {
            Some(tenant) => {
                self.ensure_exclusive_schema(&tenant).await?;
                self.run_for_tenant(&tenant, as_of).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Fails when another business in the directory maps onto `tenant`'s schema.
    async fn ensure_exclusive_schema(&self, tenant: &Tenant) -> Result<(), ProvisionError> {
        let tenants = self.tenants.list_tenants().await?;
        match schema_collisions(tenants.iter().chain([tenant])).get(&tenant.schema) {
            Some(codes) => Err(collision(tenant, codes)),
            None => Ok(()),
        }
    }

    async fn provision_set(
        &self,
        tenant: &Tenant,
        set: &ProvisioningSet,
    ) -> Result<ProvisionReport, ProvisionError> {
        debug!(
            schema = %tenant.schema,
            packages = ?set.packages(),
            tables = set.descriptors().len(),
            "Resolved provisioning set"
        );
        let mut report = self.provisioner.provision(tenant, set.descriptors()).await?;
        report.unknown_features = set.unknown_features().to_vec();
        Ok(report)
    }

    /// Runs `work` holding `tenant`'s lock, under the tenant deadline.
    ///
    /// The deadline covers the lock wait as well, so a run queued behind a
    /// stalled one times out instead of waiting forever.
    async fn guarded<F>(&self, tenant: &Tenant, work: F) -> Result<ProvisionReport, ProvisionError>
    where
        F: Future<Output = Result<ProvisionReport, ProvisionError>>,
    {
        let deadline = self.config.tenant_timeout();
        let outcome = tokio::time::timeout(deadline, async {
            let _guard = self.locks.acquire(&tenant.schema).await;
            work.await
        })
        .await;

        let result = outcome.unwrap_or_else(|_| {
            Err(ProvisionError::Timeout {
                schema: tenant.schema.to_string(),
                seconds: deadline.as_secs(),
            })
        });

        match &result {
            Ok(report) => info!(
                schema = %tenant.schema,
                code = %tenant.code,
                applied = report.applied_count(),
                failures = report.failures().count(),
                "Tenant provisioned"
            ),
            Err(e) => warn!(
                schema = %tenant.schema,
                code = %tenant.code,
                error = %e,
                error_code = e.error_code(),
                "Tenant provisioning failed"
            ),
        }

        result
    }
}

fn collision(tenant: &Tenant, codes: &[String]) -> ProvisionError {
    warn!(
        schema = %tenant.schema,
        code = %tenant.code,
        codes = ?codes,
        "Refusing to provision a schema shared by several businesses"
    );
    ProvisionError::SchemaCollision {
        schema: tenant.schema.to_string(),
        codes: codes.to_vec(),
    }
}
