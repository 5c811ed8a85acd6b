//! Purchase and entitlement types.

use bizhub_shared::types::{BusinessId, PurchaseId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

use crate::entitlement::error::EntitlementError;

/// A confirmed package purchase. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    /// Purchase ID.
    pub id: PurchaseId,
    /// Buying business.
    pub business_id: BusinessId,
    /// Billing package identifier.
    pub package_id: String,
    /// JSON array of feature names, serialized at purchase time.
    pub feature_names: String,
    /// JSON array of granted table names, serialized at purchase time.
    pub granted_table_names: String,
    /// Start of the subscription window.
    pub active_from: DateTime<Utc>,
    /// End of the subscription window (inclusive).
    pub active_until: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Whether the purchase still grants anything at `as_of`.
    #[must_use]
    pub fn is_active_at(&self, as_of: DateTime<Utc>) -> bool {
        as_of <= self.active_until
    }

    /// Parses the serialized lists. Malformed lists are logged and read as empty.
    #[must_use]
    pub fn grant(&self) -> PurchaseGrant {
        PurchaseGrant::from_serialized(&self.feature_names, &self.granted_table_names)
    }
}

/// Parses a serialized name list.
///
/// Blank input and JSON `null` are an empty list. Entries are trimmed and
/// blank entries dropped.
pub fn parse_name_list(raw: &str, field: &'static str) -> Result<Vec<String>, EntitlementError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let names: Option<Vec<String>> =
        serde_json::from_str(raw).map_err(|e| EntitlementError::PurchaseParse {
            field,
            reason: e.to_string(),
        })?;

    Ok(names
        .unwrap_or_default()
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

/// Serializes a name list the way purchase records store it.
#[must_use]
pub fn serialize_name_list(names: &[String]) -> String {
    serde_json::Value::from(names.to_vec()).to_string()
}

/// What a single purchase grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurchaseGrant {
    /// Purchased feature package names.
    pub feature_names: Vec<String>,
    /// Tables the purchase is restricted to. Empty means every table of the packages.
    pub table_names: Vec<String>,
}

impl PurchaseGrant {
    /// Parses both serialized lists, reading a malformed list as empty.
    #[must_use]
    pub fn from_serialized(feature_names: &str, table_names: &str) -> Self {
        Self {
            feature_names: parse_or_empty(feature_names, "feature_names"),
            table_names: parse_or_empty(table_names, "granted_table_names"),
        }
    }
}

fn parse_or_empty(raw: &str, field: &'static str) -> Vec<String> {
    parse_name_list(raw, field).unwrap_or_else(|e| {
        warn!(error = %e, field, "Ignoring malformed purchase list");
        Vec::new()
    })
}

/// Optional entitlements of one tenant. The always-on packages are not listed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entitlements {
    /// Union of purchased feature names.
    pub feature_names: BTreeSet<String>,
    /// Union of granted table names.
    pub table_names: BTreeSet<String>,
    /// Each active purchase's grant. Table restrictions apply per grant.
    pub grants: Vec<PurchaseGrant>,
}

impl Entitlements {
    /// Folds every record still active at `as_of`.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a PurchaseRecord>,
        as_of: DateTime<Utc>,
    ) -> Self {
        let mut entitlements = Self::default();
        for record in records.into_iter().filter(|r| r.is_active_at(as_of)) {
            entitlements.merge(record.grant());
        }
        entitlements
    }

    /// Adds one grant to the union.
    pub fn merge(&mut self, grant: PurchaseGrant) {
        self.feature_names.extend(grant.feature_names.iter().cloned());
        self.table_names.extend(grant.table_names.iter().cloned());
        self.grants.push(grant);
    }

    /// True when nothing optional is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty() && self.table_names.is_empty()
    }
}

impl From<PurchaseGrant> for Entitlements {
    fn from(grant: PurchaseGrant) -> Self {
        let mut entitlements = Self::default();
        entitlements.merge(grant);
        entitlements
    }
}
