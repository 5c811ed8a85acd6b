//! Property-based tests for the orchestrator.
//!
//! Each case picks a random set of purchased packages and a random set of
//! tables that already exist (with only their declared columns) before the
//! run, then checks convergence, idempotence and pass ordering.

use std::sync::Arc;

use proptest::prelude::*;

use crate::entitlement::PurchaseGrant;
use crate::packages::FeaturePackage;
use crate::provisioning::orchestrator::Provisioner;
use crate::provisioning::plan::ProvisioningSet;
use crate::schema::{AlterOp, TableDescriptor};
use crate::testing::{MemoryCatalog, tenant};

/// Strategy for a subset of the optional packages.
fn arb_features() -> impl Strategy<Value = Vec<FeaturePackage>> {
    let optional: Vec<_> = FeaturePackage::ALL
        .into_iter()
        .filter(|p| !p.is_default())
        .collect();
    let len = optional.len();
    prop::sample::subsequence(optional, 0..=len)
}

fn plan(features: &[FeaturePackage]) -> ProvisioningSet {
    ProvisioningSet::from_grant(&PurchaseGrant {
        feature_names: features.iter().map(ToString::to_string).collect(),
        table_names: Vec::new(),
    })
}

/// Pre-creates the descriptors selected by `mask`, without pending changes.
fn seed(catalog: &MemoryCatalog, descriptors: &[&TableDescriptor], mask: u64) {
    for (i, descriptor) in descriptors.iter().enumerate() {
        if mask & (1 << (i % 64)) != 0 {
            let columns: Vec<&str> = descriptor.columns.iter().map(|c| c.name.as_str()).collect();
            catalog.seed_table("biz_acme", &descriptor.name, &columns);
        }
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

/// Pass a statement belongs to: 0 schema, 1 create, 2 column, 3 foreign key.
fn pass_of(sql: &str) -> u8 {
    if sql.starts_with("CREATE DATABASE") {
        0
    } else if sql.starts_with("CREATE TABLE") {
        1
    } else if sql.contains(" FOREIGN KEY ") {
        3
    } else {
        2
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// A second run with the same descriptors issues no statement.
    #[test]
    fn prop_second_run_is_a_no_op(features in arb_features(), mask in any::<u64>()) {
        let set = plan(&features);
        let catalog = Arc::new(MemoryCatalog::new());
        seed(&catalog, set.descriptors(), mask);
        let provisioner = Provisioner::new(Arc::clone(&catalog));
        let acme = tenant("acme");

        let first = block_on(provisioner.provision(&acme, set.descriptors())).unwrap();
        prop_assert!(!first.has_failures(), "{:?}", first.failures().collect::<Vec<_>>());
        let executed = catalog.executed().len();

        let second = block_on(provisioner.provision(&acme, set.descriptors())).unwrap();
        prop_assert_eq!(second.applied_count(), 0);
        prop_assert_eq!(catalog.executed().len(), executed);
        prop_assert!(!second.schema_created);
    }

    /// Every pending add column exists afterwards and every pending drop is gone.
    #[test]
    fn prop_pending_columns_converge(features in arb_features(), mask in any::<u64>()) {
        let set = plan(&features);
        let catalog = Arc::new(MemoryCatalog::new());
        seed(&catalog, set.descriptors(), mask);
        let provisioner = Provisioner::new(Arc::clone(&catalog));

        block_on(provisioner.provision(&tenant("acme"), set.descriptors())).unwrap();

        for descriptor in set.descriptors() {
            prop_assert!(catalog.has_table("biz_acme", &descriptor.name));
            for column in &descriptor.pending_columns {
                let present = catalog.has_column("biz_acme", &descriptor.name, &column.name);
                prop_assert_eq!(present, column.op == AlterOp::Add);
            }
            for fk in &descriptor.pending_foreign_keys {
                let present = catalog.has_foreign_key("biz_acme", &descriptor.name, &fk.column);
                prop_assert_eq!(present, fk.op == AlterOp::Add);
            }
        }
    }

    /// Statements run pass by pass: schema, then tables, then columns, then foreign keys.
    #[test]
    fn prop_passes_run_in_order(features in arb_features(), mask in any::<u64>()) {
        let set = plan(&features);
        let catalog = Arc::new(MemoryCatalog::new());
        seed(&catalog, set.descriptors(), mask);
        let provisioner = Provisioner::new(Arc::clone(&catalog));

        block_on(provisioner.provision(&tenant("acme"), set.descriptors())).unwrap();

        let passes: Vec<u8> = catalog.executed().iter().map(|sql| pass_of(sql)).collect();
        prop_assert!(passes.windows(2).all(|w| w[0] <= w[1]), "{:?}", passes);

        // Every referenced table was created before the key pointing at it.
        let executed = catalog.executed();
        for (i, sql) in executed.iter().enumerate() {
            if let Some((_, target)) = sql.split_once(" REFERENCES ") {
                let table = target.split(' ').next().unwrap_or_default();
                let created = format!("CREATE TABLE {table} ");
                if let Some(j) = executed.iter().position(|s| s.starts_with(&created)) {
                    prop_assert!(j < i, "{} created after {}", table, sql);
                }
            }
        }
    }
}
