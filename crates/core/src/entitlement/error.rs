//! Entitlement error types.

use thiserror::Error;

/// Errors raised while resolving a tenant's purchases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntitlementError {
    /// Purchase records could not be read.
    #[error("Purchase storage error: {0}")]
    Storage(String),

    /// A serialized name list on a purchase record is malformed.
    #[error("Malformed {field} list: {reason}")]
    PurchaseParse {
        /// Which list failed to parse.
        field: &'static str,
        /// Parser message.
        reason: String,
    },
}

impl EntitlementError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "PURCHASE_STORAGE_ERROR",
            Self::PurchaseParse { .. } => "PURCHASE_PARSE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EntitlementError::Storage("down".into()).error_code(),
            "PURCHASE_STORAGE_ERROR"
        );
        let err = EntitlementError::PurchaseParse {
            field: "feature_names",
            reason: "expected value".into(),
        };
        assert_eq!(err.error_code(), "PURCHASE_PARSE_ERROR");
        assert_eq!(err.to_string(), "Malformed feature_names list: expected value");
    }
}
