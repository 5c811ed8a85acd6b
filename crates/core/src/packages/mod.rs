//! Feature package catalog.
//!
//! Maps every [`FeaturePackage`] to its ordered table descriptors. The
//! mapping is a total `match`, so adding a package without tables does not
//! compile. Descriptors are built once on first use and read-only after.

pub mod feature;
mod tables;

pub use feature::{FeatureError, FeaturePackage};

use crate::schema::TableDescriptor;

impl FeaturePackage {
    /// The package's table descriptors, in creation order.
    #[must_use]
    pub fn descriptors(self) -> &'static [TableDescriptor] {
        match self {
            Self::Core => tables::base::TABLES.as_slice(),
            Self::AppDefault => tables::app_default::TABLES.as_slice(),
            Self::Crm => tables::crm::TABLES.as_slice(),
            Self::Inventory => tables::inventory::TABLES.as_slice(),
            Self::MiniAccount => tables::mini_account::TABLES.as_slice(),
            Self::Pos => tables::pos::TABLES.as_slice(),
            Self::HumanResourceManagement => tables::hr::TABLES.as_slice(),
        }
    }
}

/// Finds the package and descriptor that define `table`.
#[must_use]
pub fn find_table(table: &str) -> Option<(FeaturePackage, &'static TableDescriptor)> {
    FeaturePackage::ALL.into_iter().find_map(|package| {
        package
            .descriptors()
            .iter()
            .find(|d| d.name == table)
            .map(|d| (package, d))
    })
}
