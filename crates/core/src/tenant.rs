//! Tenant identity and schema naming.
//!
//! Every business owns exactly one schema, named deterministically from its
//! unique code. The schema is created once and never dropped here.

use bizhub_shared::types::BusinessId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Longest identifier the target store accepts.
pub const MAX_SCHEMA_NAME_LEN: usize = 64;

/// Errors raised while naming a tenant schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaNameError {
    /// Nothing left to name the schema after.
    #[error("Schema name is empty")]
    Empty,

    /// Name exceeds the identifier limit.
    #[error("Schema name {name} is {len} characters, limit is {MAX_SCHEMA_NAME_LEN}")]
    TooLong {
        /// The offending name.
        name: String,
        /// Its length.
        len: usize,
    },

    /// Name contains a character outside `[a-z0-9_]`.
    #[error("Schema name {name} contains invalid character {ch:?}")]
    InvalidCharacter {
        /// The offending name.
        name: String,
        /// First invalid character.
        ch: char,
    },
}

/// A validated tenant schema name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantSchema(String);

impl TenantSchema {
    /// Derives the schema name for a business code.
    ///
    /// The code is lowercased and every character outside `[a-z0-9_]`
    /// becomes `_`, so `"Acme Corp."` with prefix `biz_` yields `biz_acme_corp_`.
    pub fn for_business(prefix: &str, code: &str) -> Result<Self, SchemaNameError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SchemaNameError::Empty);
        }

        let sanitized: String = code
            .chars()
            .flat_map(char::to_lowercase)
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Self::parse(&format!("{prefix}{sanitized}"))
    }

    /// Validates an existing schema name.
    pub fn parse(name: &str) -> Result<Self, SchemaNameError> {
        if name.is_empty() {
            return Err(SchemaNameError::Empty);
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
        {
            return Err(SchemaNameError::InvalidCharacter {
                name: name.to_string(),
                ch,
            });
        }
        if name.len() > MAX_SCHEMA_NAME_LEN {
            return Err(SchemaNameError::TooLong {
                name: name.to_string(),
                len: name.len(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the schema name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantSchema {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A business together with the schema it is provisioned into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    /// Owning business.
    pub business_id: BusinessId,
    /// The business's unique code.
    pub code: String,
    /// Schema the business's tables live in.
    pub schema: TenantSchema,
}

impl Tenant {
    /// Builds a tenant, deriving the schema from the business code.
    pub fn new(
        business_id: BusinessId,
        code: impl Into<String>,
        schema_prefix: &str,
    ) -> Result<Self, SchemaNameError> {
        let code = code.into();
        let schema = TenantSchema::for_business(schema_prefix, &code)?;
        Ok(Self {
            business_id,
            code,
            schema,
        })
    }
}

/// Schemas that more than one business maps onto, with the sorted codes
/// of every business sharing each one.
///
/// Code sanitizing is lossy, so `shop-42` and `shop_42` land on the same
/// schema. Such tenants must never be provisioned.
#[must_use]
pub fn schema_collisions<'a>(
    tenants: impl IntoIterator<Item = &'a Tenant>,
) -> BTreeMap<TenantSchema, Vec<String>> {
    let mut by_schema: BTreeMap<&TenantSchema, Vec<&Tenant>> = BTreeMap::new();
    for tenant in tenants {
        let owners = by_schema.entry(&tenant.schema).or_default();
        if owners.iter().all(|t| t.business_id != tenant.business_id) {
            owners.push(tenant);
        }
    }

    by_schema
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .map(|(schema, owners)| {
            let mut codes: Vec<String> = owners.iter().map(|t| t.code.clone()).collect();
            codes.sort();
            (schema.clone(), codes)
        })
        .collect()
}
