//! Cart error types.

use thiserror::Error;

use crate::types::{ProductId, ProductIdError};

/// Errors returned by cart operations.
///
/// Every cart operation is local, so the only way one can fail is malformed
/// input. A failed call leaves the cart exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The caller passed a malformed product id, quantity, price or discount.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CartError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<ProductIdError> for CartError {
    fn from(err: ProductIdError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Errors returned when restoring a persisted cart.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The payload is not valid JSON for a persisted cart.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The snapshot was written by a newer schema than this build understands.
    #[error("unsupported cart schema version {found} (latest supported is {supported})")]
    UnsupportedVersion {
        /// Version tag found in the payload.
        found: u32,
        /// Highest version this build can read.
        supported: u32,
    },

    /// A line item breaks a cart invariant.
    #[error("invalid line item {product_id}: {reason}")]
    InvalidItem {
        /// Offending product.
        product_id: ProductId,
        /// What is wrong with it.
        reason: String,
    },

    /// The same product appears in more than one line.
    #[error("duplicate line item for product {0}")]
    DuplicateProduct(ProductId),

    /// The stored discount is not valid.
    #[error("invalid discount: {0}")]
    InvalidDiscount(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::invalid("quantity must not be negative");
        assert_eq!(
            err.to_string(),
            "invalid argument: quantity must not be negative"
        );
    }

    #[test]
    fn test_from_product_id_error() {
        let err = CartError::from(ProductIdError::Empty);
        assert_eq!(
            err,
            CartError::InvalidArgument("product id cannot be empty".to_string())
        );
    }

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::UnsupportedVersion {
            found: 9,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "unsupported cart schema version 9 (latest supported is 1)"
        );
    }
}
