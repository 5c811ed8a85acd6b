//! Entitlement resolution.
//!
//! Reduces a business's confirmed purchases to the feature names and table
//! names it is entitled to at a point in time. Only optional entitlements
//! are reported; the always-on packages are added by the provisioning plan.

pub mod error;
pub mod resolver;
pub mod types;

pub use error::EntitlementError;
pub use resolver::{PurchaseSource, resolve_entitlements};
pub use types::{
    Entitlements, PurchaseGrant, PurchaseRecord, parse_name_list, serialize_name_list,
};

#[cfg(test)]
mod resolver_props;
