//! Purchase resolution.

use async_trait::async_trait;
use bizhub_shared::types::BusinessId;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::entitlement::error::EntitlementError;
use crate::entitlement::types::{Entitlements, PurchaseRecord};

/// Read access to recorded purchases.
#[async_trait]
pub trait PurchaseSource: Send + Sync {
    /// Purchases of `business_id` whose window has not ended at `as_of`.
    ///
    /// Implementations may return extra records; the resolver filters again.
    async fn active_purchases(
        &self,
        business_id: BusinessId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<PurchaseRecord>, EntitlementError>;
}

/// Resolves the optional entitlements of one business.
///
/// Storage errors propagate so the caller can fail this tenant alone.
/// Malformed lists on individual records are read as empty.
pub async fn resolve_entitlements<S>(
    source: &S,
    business_id: BusinessId,
    as_of: DateTime<Utc>,
) -> Result<Entitlements, EntitlementError>
where
    S: PurchaseSource + ?Sized,
{
    let records = source.active_purchases(business_id, as_of).await?;
    let entitlements = Entitlements::from_records(&records, as_of);

    debug!(
        %business_id,
        purchases = records.len(),
        features = ?entitlements.feature_names,
        tables = entitlements.table_names.len(),
        "Resolved entitlements"
    );

    Ok(entitlements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizhub_shared::types::PurchaseId;
    use chrono::Duration;
    use std::sync::Mutex;

    /// Returns every stored record for the business, expired ones included.
    struct VecPurchases {
        records: Mutex<Vec<PurchaseRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl PurchaseSource for VecPurchases {
        async fn active_purchases(
            &self,
            business_id: BusinessId,
            _as_of: DateTime<Utc>,
        ) -> Result<Vec<PurchaseRecord>, EntitlementError> {
            if self.fail {
                return Err(EntitlementError::Storage("connection reset".into()));
            }
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.business_id == business_id)
                .cloned()
                .collect())
        }
    }

    fn purchase(
        business_id: BusinessId,
        features: &str,
        until: DateTime<Utc>,
    ) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseId::new(),
            business_id,
            package_id: "pkg".into(),
            feature_names: features.into(),
            granted_table_names: String::new(),
            active_from: until - Duration::days(30),
            active_until: until,
        }
    }

    #[tokio::test]
    async fn test_resolve_filters_expired_even_if_source_returns_them() {
        let now = Utc::now();
        let acme = BusinessId::new();
        let source = VecPurchases {
            records: Mutex::new(vec![
                purchase(acme, r#"["CRM"]"#, now - Duration::days(1)),
                purchase(acme, r#"["HR"]"#, now + Duration::days(1)),
                purchase(BusinessId::new(), r#"["POS"]"#, now + Duration::days(1)),
            ]),
            fail: false,
        };

        let entitlements = resolve_entitlements(&source, acme, now).await.unwrap();
        assert_eq!(
            entitlements.feature_names.into_iter().collect::<Vec<_>>(),
            ["HR"]
        );
    }

    #[tokio::test]
    async fn test_resolve_with_no_purchases_is_empty() {
        let source = VecPurchases {
            records: Mutex::new(Vec::new()),
            fail: false,
        };
        let entitlements = resolve_entitlements(&source, BusinessId::new(), Utc::now())
            .await
            .unwrap();
        assert!(entitlements.is_empty());
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let source = VecPurchases {
            records: Mutex::new(Vec::new()),
            fail: true,
        };
        let err = resolve_entitlements(&source, BusinessId::new(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, EntitlementError::Storage("connection reset".into()));
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_block_others() {
        let now = Utc::now();
        let acme = BusinessId::new();
        let source = VecPurchases {
            records: Mutex::new(vec![
                purchase(acme, "CRM,POS", now + Duration::days(1)),
                purchase(acme, r#"["Inventory"]"#, now + Duration::days(1)),
            ]),
            fail: false,
        };
        let entitlements = resolve_entitlements(&source, acme, now).await.unwrap();
        assert_eq!(
            entitlements.feature_names.into_iter().collect::<Vec<_>>(),
            ["Inventory"]
        );
    }
}
