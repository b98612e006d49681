//! Versioned, serializable form of a cart.
//!
//! The persisted shape is a flat list of line items plus a schema version
//! tag. Fields added in later versions must carry serde defaults so carts
//! written by older builds keep loading.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state::MAX_CART_TOTAL;
use super::{CartState, Discount, LineItem, SnapshotError};

/// Latest schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// A cart as stored by a persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCart {
    pub schema_version: u32,
    #[serde(default)]
    pub revision: u64,
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
}

impl PersistedCart {
    /// Parse a persisted cart from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if the JSON does not have the
    /// persisted cart shape.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the cart invariants and build the in-memory state.
    ///
    /// # Errors
    ///
    /// Fails on a newer schema version, a zero quantity, a negative price, a
    /// duplicated product, a subtotal above [`MAX_CART_TOTAL`], or an invalid
    /// discount.
    pub fn into_state(self) -> Result<CartState, SnapshotError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        let mut subtotal = Decimal::ZERO;
        for item in &self.items {
            if item.quantity == 0 {
                return Err(SnapshotError::InvalidItem {
                    product_id: item.product_id.clone(),
                    reason: "quantity must be at least 1".to_string(),
                });
            }
            if item.unit_price < Decimal::ZERO {
                return Err(SnapshotError::InvalidItem {
                    product_id: item.product_id.clone(),
                    reason: "unit price cannot be negative".to_string(),
                });
            }
            if !seen.insert(&item.product_id) {
                return Err(SnapshotError::DuplicateProduct(item.product_id.clone()));
            }
            subtotal = item
                .unit_price
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|line| subtotal.checked_add(line))
                .filter(|total| *total <= MAX_CART_TOTAL)
                .ok_or_else(|| SnapshotError::InvalidItem {
                    product_id: item.product_id.clone(),
                    reason: format!("cart total would exceed {MAX_CART_TOTAL}"),
                })?;
        }

        if let Some(discount) = &self.discount {
            discount
                .validate()
                .map_err(|e| SnapshotError::InvalidDiscount(e.to_string()))?;
        }

        Ok(CartState::from_parts(self.items, self.discount, self.revision))
    }
}

impl From<CartState> for PersistedCart {
    fn from(state: CartState) -> Self {
        let (items, discount, revision) = state.into_parts();
        Self {
            schema_version: SCHEMA_VERSION,
            revision,
            items,
            discount,
        }
    }
}

impl From<&CartState> for PersistedCart {
    fn from(state: &CartState) -> Self {
        Self::from(state.clone())
    }
}

impl TryFrom<PersistedCart> for CartState {
    type Error = SnapshotError;

    fn try_from(persisted: PersistedCart) -> Result<Self, Self::Error> {
        persisted.into_state()
    }
}
