//! Line items and the input used to create them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One product entry in a cart.
///
/// `name`, `unit_price` and `images` are captured when the product is first
/// added and are never refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub added_at: DateTime<Utc>,
    /// Last time the quantity changed.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl LineItem {
    /// `unit_price * quantity`, exact.
    ///
    /// Saturates at `Decimal::MAX`; lines inside a cart are bounded by
    /// [`MAX_CART_TOTAL`](super::MAX_CART_TOTAL) and never get there.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Caller-supplied data for adding a product to the cart.
///
/// The product id is kept as a raw string here; the store validates it and
/// rejects malformed input with [`CartError::InvalidArgument`](super::CartError).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewLineItem {
    /// Create an add request without images.
    #[must_use]
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            images: Vec::new(),
        }
    }

    /// Attach image references, in display order.
    #[must_use]
    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }
}
