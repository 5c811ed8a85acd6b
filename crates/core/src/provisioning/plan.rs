//! Resolved provisioning set.
//!
//! Turns a tenant's entitlements into the ordered descriptor list handed to
//! the orchestrator. Default packages are always present and never narrowed.
//! A purchase that names some of a package's own tables narrows that package
//! to them. Purchases are unioned after narrowing, so one restricted purchase
//! never narrows another.

use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use crate::entitlement::{Entitlements, PurchaseGrant};
use crate::packages::FeaturePackage;
use crate::schema::TableDescriptor;

/// Descriptors one tenant run reconciles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningSet {
    packages: Vec<FeaturePackage>,
    descriptors: Vec<&'static TableDescriptor>,
    unknown_features: Vec<String>,
}

impl ProvisioningSet {
    /// Only the always-on packages.
    #[must_use]
    pub fn defaults() -> Self {
        Self::from_entitlements(&Entitlements::default())
    }

    /// Builds the set for resolved entitlements.
    ///
    /// Packages are emitted in [`FeaturePackage`] declaration order whatever
    /// order the purchases listed them in. Unknown feature names are logged
    /// and kept for the report.
    #[must_use]
    pub fn from_entitlements(entitlements: &Entitlements) -> Self {
        let mut packages: BTreeSet<FeaturePackage> = FeaturePackage::DEFAULTS.into();
        let mut granted: HashSet<&'static str> = HashSet::new();
        let mut unknown_features = BTreeSet::new();

        for grant in &entitlements.grants {
            for name in &grant.feature_names {
                match name.parse::<FeaturePackage>() {
                    Ok(package) => {
                        packages.insert(package);
                        granted.extend(granted_tables(package, grant));
                    }
                    Err(err) => {
                        warn!(feature = %name, error = %err, "Ignoring unknown feature name");
                        unknown_features.insert(name.clone());
                    }
                }
            }
        }

        let granted = &granted;
        let mut seen = HashSet::new();
        let descriptors = packages
            .iter()
            .flat_map(|package| {
                package
                    .descriptors()
                    .iter()
                    .filter(move |d| package.is_default() || granted.contains(d.name.as_str()))
            })
            .filter(|d| seen.insert(d.name.as_str()))
            .collect();

        Self {
            packages: packages.into_iter().collect(),
            descriptors,
            unknown_features: unknown_features.into_iter().collect(),
        }
    }

    /// Builds the set for a single purchase, without consulting other purchases.
    #[must_use]
    pub fn from_grant(grant: &PurchaseGrant) -> Self {
        Self::from_entitlements(&Entitlements::from(grant.clone()))
    }

    /// Packages included, defaults first.
    #[must_use]
    pub fn packages(&self) -> &[FeaturePackage] {
        &self.packages
    }

    /// Descriptors in provisioning order.
    #[must_use]
    pub fn descriptors(&self) -> &[&'static TableDescriptor] {
        &self.descriptors
    }

    /// Feature names that did not match any package.
    #[must_use]
    pub fn unknown_features(&self) -> &[String] {
        &self.unknown_features
    }
}

/// Tables of `package` one purchase grants: the ones it names, or all of them
/// when it names none of this package's tables.
fn granted_tables(
    package: FeaturePackage,
    grant: &PurchaseGrant,
) -> impl Iterator<Item = &'static str> + '_ {
    let own = package.descriptors();
    let restricted = own.iter().any(|d| grant.table_names.contains(&d.name));
    own.iter()
        .filter(move |d| !restricted || grant.table_names.contains(&d.name))
        .map(|d| d.name.as_str())
}
