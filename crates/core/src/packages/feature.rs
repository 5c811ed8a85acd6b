//! Feature package enumeration.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading feature names from purchase data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// Name does not match any known package.
    #[error("Unknown feature name: {0}")]
    UnknownFeature(String),
}

/// A purchasable (or always-on) bundle of tenant tables.
///
/// Declaration order is the provisioning order of package descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FeaturePackage {
    /// Always-on: roles, employees, business settings.
    Core,
    /// Always-on: notifications, activity log, stored files.
    AppDefault,
    /// Customers, leads and interactions.
    #[serde(rename = "CRM")]
    Crm,
    /// Categories, items and stock movements.
    Inventory,
    /// Ledgers and vouchers.
    MiniAccount,
    /// Registers, sales and sale items.
    #[serde(rename = "POS")]
    Pos,
    /// Departments, attendance, leave and payroll.
    #[serde(rename = "HR")]
    HumanResourceManagement,
}

impl FeaturePackage {
    /// Every package, in provisioning order.
    pub const ALL: [Self; 7] = [
        Self::Core,
        Self::AppDefault,
        Self::Crm,
        Self::Inventory,
        Self::MiniAccount,
        Self::Pos,
        Self::HumanResourceManagement,
    ];

    /// Packages every tenant has regardless of purchases.
    pub const DEFAULTS: [Self; 2] = [Self::Core, Self::AppDefault];

    /// Returns the canonical name stored in purchase records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "Core",
            Self::AppDefault => "AppDefault",
            Self::Crm => "CRM",
            Self::Inventory => "Inventory",
            Self::MiniAccount => "MiniAccount",
            Self::Pos => "POS",
            Self::HumanResourceManagement => "HR",
        }
    }

    /// Returns true for the always-on packages.
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Core | Self::AppDefault)
    }
}

impl fmt::Display for FeaturePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeaturePackage {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "core" => Ok(Self::Core),
            "appdefault" => Ok(Self::AppDefault),
            "crm" => Ok(Self::Crm),
            "inventory" => Ok(Self::Inventory),
            "miniaccount" => Ok(Self::MiniAccount),
            "pos" => Ok(Self::Pos),
            "hr" | "humanresourcemanagement" => Ok(Self::HumanResourceManagement),
            _ => Err(FeatureError::UnknownFeature(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CRM", FeaturePackage::Crm)]
    #[case("crm", FeaturePackage::Crm)]
    #[case(" Inventory ", FeaturePackage::Inventory)]
    #[case("MiniAccount", FeaturePackage::MiniAccount)]
    #[case("mini-account", FeaturePackage::MiniAccount)]
    #[case("POS", FeaturePackage::Pos)]
    #[case("HR", FeaturePackage::HumanResourceManagement)]
    #[case("HumanResourceManagement", FeaturePackage::HumanResourceManagement)]
    #[case("app-default", FeaturePackage::AppDefault)]
    #[case("core", FeaturePackage::Core)]
    fn test_parse_feature_names(#[case] raw: &str, #[case] expected: FeaturePackage) {
        assert_eq!(raw.parse::<FeaturePackage>(), Ok(expected));
    }

    #[test]
    fn test_unknown_feature_is_an_error() {
        assert_eq!(
            "Payroll+".parse::<FeaturePackage>(),
            Err(FeatureError::UnknownFeature("Payroll+".into()))
        );
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for package in FeaturePackage::ALL {
            assert_eq!(package.as_str().parse::<FeaturePackage>(), Ok(package));
        }
    }

    #[test]
    fn test_only_core_and_app_default_are_default() {
        let defaults: Vec<_> = FeaturePackage::ALL
            .into_iter()
            .filter(|p| p.is_default())
            .collect();
        assert_eq!(defaults, FeaturePackage::DEFAULTS);
    }
}
