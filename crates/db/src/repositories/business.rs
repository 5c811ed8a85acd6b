//! Business repository and the tenant directory built on it.

use async_trait::async_trait;
use bizhub_core::provisioning::{ProvisionError, TenantDirectory};
use bizhub_core::tenant::Tenant;
use bizhub_shared::types::BusinessId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::warn;

use crate::entities::businesses;

/// Business repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    db: DatabaseConnection,
}

impl BusinessRepository {
    /// Creates a new business repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a business. Its schema is provisioned separately.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails, including a duplicate code.
    pub async fn create(&self, name: &str, unique_code: &str) -> Result<businesses::Model, DbErr> {
        let now = chrono::Utc::now();

        businesses::ActiveModel {
            id: Set(BusinessId::new().into_inner()),
            name: Set(name.to_string()),
            unique_code: Set(unique_code.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Finds an active business by its unique code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_by_code(
        &self,
        code: &str,
    ) -> Result<Option<businesses::Model>, DbErr> {
        businesses::Entity::find()
            .filter(businesses::Column::UniqueCode.eq(code))
            .filter(businesses::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Lists every business, inactive ones included, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> Result<Vec<businesses::Model>, DbErr> {
        businesses::Entity::find()
            .order_by_asc(businesses::Column::UniqueCode)
            .all(&self.db)
            .await
    }

    /// Lists active businesses ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<businesses::Model>, DbErr> {
        businesses::Entity::find()
            .filter(businesses::Column::IsActive.eq(true))
            .order_by_asc(businesses::Column::UniqueCode)
            .all(&self.db)
            .await
    }
}

/// Tenant directory over the active businesses.
#[derive(Debug, Clone)]
pub struct BusinessDirectory {
    businesses: BusinessRepository,
    schema_prefix: String,
}

impl BusinessDirectory {
    /// Creates a directory naming schemas with `schema_prefix`.
    #[must_use]
    pub fn new(db: DatabaseConnection, schema_prefix: impl Into<String>) -> Self {
        Self {
            businesses: BusinessRepository::new(db),
            schema_prefix: schema_prefix.into(),
        }
    }

    /// Prefix prepended to every schema name.
    #[must_use]
    pub fn schema_prefix(&self) -> &str {
        &self.schema_prefix
    }

    /// Builds the tenant for a business row.
    ///
    /// # Errors
    ///
    /// Returns an error if the business code cannot form a schema name.
    pub fn tenant_for(&self, business: &businesses::Model) -> Result<Tenant, ProvisionError> {
        Tenant::new(
            BusinessId::from_uuid(business.id),
            business.unique_code.clone(),
            &self.schema_prefix,
        )
        .map_err(|e| {
            ProvisionError::TenantDirectory(format!(
                "business {} has an unusable code: {e}",
                business.unique_code
            ))
        })
    }
}

fn directory_error(err: &DbErr) -> ProvisionError {
    ProvisionError::TenantDirectory(err.to_string())
}

#[async_trait]
impl TenantDirectory for BusinessDirectory {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ProvisionError> {
        let businesses = self
            .businesses
            .list_active()
            .await
            .map_err(|e| directory_error(&e))?;

        Ok(businesses
            .iter()
            .filter_map(|business| {
                self.tenant_for(business)
                    .inspect_err(|e| warn!(error = %e, "Skipping business"))
                    .ok()
            })
            .collect())
    }

    async fn find_tenant(&self, code: &str) -> Result<Option<Tenant>, ProvisionError> {
        self.businesses
            .find_active_by_code(code)
            .await
            .map_err(|e| directory_error(&e))?
            .map(|business| self.tenant_for(&business))
            .transpose()
    }
}
