//! Property-based tests for entitlement resolution.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::entitlement::resolver::resolve_entitlements;
use crate::entitlement::types::{Entitlements, serialize_name_list};
use crate::testing::{MemoryPurchases, purchase, tenant};

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z_]{1,16}", 0..4)
}

/// Offsets in seconds relative to `as_of`; negative means already ended.
fn arb_offsets() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-10_000_000i64..10_000_000, 1..6)
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Purchases that ended before `as_of` grant nothing.
    #[test]
    fn prop_expired_purchases_grant_nothing(
        features in arb_names(),
        tables in arb_names(),
        ended_seconds_ago in prop::collection::vec(1i64..10_000_000, 1..6),
    ) {
        let as_of = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let acme = tenant("acme");
        let records = ended_seconds_ago
            .iter()
            .map(|s| purchase(
                &acme,
                &serialize_name_list(&features),
                &serialize_name_list(&tables),
                as_of - Duration::seconds(*s),
            ))
            .collect::<Vec<_>>();

        let direct = Entitlements::from_records(&records, as_of);
        prop_assert!(direct.is_empty());

        let source = MemoryPurchases::new(records);
        let resolved = block_on(resolve_entitlements(&source, acme.business_id, as_of)).unwrap();
        prop_assert!(resolved.is_empty());
    }

    /// The result is the union of every active purchase's lists.
    #[test]
    fn prop_active_purchases_union(
        grants in prop::collection::vec((arb_names(), arb_names()), 1..5),
        offsets in arb_offsets(),
    ) {
        let as_of = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let acme = tenant("acme");
        let records = grants
            .iter()
            .zip(offsets.iter().cycle())
            .map(|((features, tables), offset)| purchase(
                &acme,
                &serialize_name_list(features),
                &serialize_name_list(tables),
                as_of + Duration::seconds(*offset),
            ))
            .collect::<Vec<_>>();

        let resolved = Entitlements::from_records(&records, as_of);

        for ((features, tables), offset) in grants.iter().zip(offsets.iter().cycle()) {
            for name in features {
                if *offset >= 0 {
                    prop_assert!(resolved.feature_names.contains(name));
                }
            }
            for name in tables {
                if *offset >= 0 {
                    prop_assert!(resolved.table_names.contains(name));
                }
            }
        }
        let granted: usize = grants
            .iter()
            .zip(offsets.iter().cycle())
            .filter(|(_, offset)| **offset >= 0)
            .map(|((features, _), _)| features.len())
            .sum();
        prop_assert!(resolved.feature_names.len() <= granted);
    }
}
