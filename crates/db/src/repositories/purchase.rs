//! Package purchase repository.
//!
//! Purchases arrive already confirmed by billing. Records are append-only;
//! expiry is decided at read time from `active_until`.

use async_trait::async_trait;
use bizhub_core::entitlement::{
    EntitlementError, PurchaseRecord, PurchaseSource, serialize_name_list,
};
use bizhub_shared::types::{BusinessId, PurchaseId};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::package_purchases;

/// Input for recording a confirmed purchase.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    /// Billing package identifier.
    pub package_id: String,
    /// Purchased feature package names.
    pub feature_names: Vec<String>,
    /// Tables the purchase is restricted to; empty grants whole packages.
    pub granted_table_names: Vec<String>,
    /// Start of the window.
    pub active_from: DateTime<Utc>,
    /// End of the window (inclusive).
    pub active_until: DateTime<Utc>,
}

/// Maps a stored row to the core record.
#[must_use]
pub fn to_record(model: package_purchases::Model) -> PurchaseRecord {
    PurchaseRecord {
        id: PurchaseId::from_uuid(model.id),
        business_id: BusinessId::from_uuid(model.business_id),
        package_id: model.package_id,
        feature_names: model.feature_names,
        granted_table_names: model.granted_table_names,
        active_from: model.active_from,
        active_until: model.active_until,
    }
}

/// Package purchase repository.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    db: DatabaseConnection,
}

impl PurchaseRepository {
    /// Creates a new purchase repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a confirmed purchase, serializing both name lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record(
        &self,
        business_id: BusinessId,
        input: &NewPurchase,
    ) -> Result<PurchaseRecord, DbErr> {
        let model = package_purchases::ActiveModel {
            id: Set(PurchaseId::new().into_inner()),
            business_id: Set(business_id.into_inner()),
            package_id: Set(input.package_id.clone()),
            feature_names: Set(serialize_name_list(&input.feature_names)),
            granted_table_names: Set(serialize_name_list(&input.granted_table_names)),
            active_from: Set(input.active_from),
            active_until: Set(input.active_until),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(to_record(model))
    }

    /// Purchases of a business whose window has not ended at `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(
        &self,
        business_id: BusinessId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PurchaseRecord>, DbErr> {
        let rows = package_purchases::Entity::find()
            .filter(package_purchases::Column::BusinessId.eq(business_id.into_inner()))
            .filter(package_purchases::Column::ActiveUntil.gte(as_of))
            .order_by_asc(package_purchases::Column::ActiveFrom)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(to_record).collect())
    }
}

#[async_trait]
impl PurchaseSource for PurchaseRepository {
    async fn active_purchases(
        &self,
        business_id: BusinessId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PurchaseRecord>, EntitlementError> {
        self.list_active(business_id, as_of)
            .await
            .map_err(|e| EntitlementError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_to_record_keeps_serialized_lists() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let business = Uuid::new_v4();
        let record = to_record(package_purchases::Model {
            id,
            business_id: business,
            package_id: "crm-annual".into(),
            feature_names: r#"["CRM"]"#.into(),
            granted_table_names: "[]".into(),
            active_from: now,
            active_until: now + Duration::days(365),
            created_at: now,
        });

        assert_eq!(record.id.into_inner(), id);
        assert_eq!(record.business_id.into_inner(), business);
        assert_eq!(record.grant().feature_names, ["CRM"]);
        assert!(record.grant().table_names.is_empty());
        assert!(record.is_active_at(now));
    }
}
