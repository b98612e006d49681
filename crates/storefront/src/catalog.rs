//! Product catalog loaded from a JSON file.
//!
//! The catalog is the source of truth for live prices, stock and discount
//! codes. The cart never reads it directly: add-to-cart copies a product's
//! data into a line item, and checkout reconciles those snapshots against the
//! catalog before an order is placed.
//!
//! # File format
//!
//! ```json
//! {
//!   "products": [
//!     { "id": "iphone-13-screen", "name": "iPhone 13 OLED Screen", "price": "349.00",
//!       "images": ["/img/iphone-13-screen.jpg"], "in_stock": true, "max_quantity": 10 }
//!   ],
//!   "discounts": [
//!     { "code": "TECH10", "kind": "percentage", "value": "10" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use nexus_core::cart::{CartError, Discount, DiscountKind, NewLineItem};
use nexus_core::{CustomerTier, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-order limit when a product does not set one.
pub const DEFAULT_MAX_QUANTITY: u32 = 999;

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate product id in catalog: {0}")]
    DuplicateProduct(ProductId),

    #[error("duplicate discount code in catalog: {0}")]
    DuplicateDiscount(String),

    #[error("invalid catalog entry {id}: {reason}")]
    InvalidEntry { id: String, reason: String },
}

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    /// Retail list price.
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
}

const fn default_in_stock() -> bool {
    true
}

const fn default_max_quantity() -> u32 {
    DEFAULT_MAX_QUANTITY
}

impl Product {
    /// Price a customer of `tier` pays for one unit.
    #[must_use]
    pub fn price_for(&self, tier: CustomerTier) -> Decimal {
        tier.price_for(self.price)
    }

    /// Build the add-to-cart input, snapshotting the tier price.
    #[must_use]
    pub fn line_item_for(&self, tier: CustomerTier) -> NewLineItem {
        NewLineItem::new(self.id.as_str(), self.name.clone(), self.price_for(tier))
            .with_images(self.images.iter().cloned())
    }
}

/// A discount code offered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl DiscountCode {
    /// Convert to the cart's discount type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the code's value is out of range.
    pub fn to_discount(&self) -> Result<Discount, CartError> {
        match self.kind {
            DiscountKind::Percentage => Discount::percentage(self.code.clone(), self.value),
            DiscountKind::Fixed => Discount::fixed(self.code.clone(), self.value),
        }
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    discounts: Vec<DiscountCode>,
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
    /// Keyed by upper-cased code.
    discounts: HashMap<String, DiscountCode>,
}

impl Catalog {
    /// Load the catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or has invalid entries.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_parts(file.products, file.discounts)
    }

    /// Build a catalog from products and discount codes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on duplicates, negative prices, a zero
    /// `max_quantity`, or an out-of-range discount.
    pub fn from_parts(
        products: Vec<Product>,
        discounts: Vec<DiscountCode>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for product in products {
            if product.price < Decimal::ZERO {
                return Err(CatalogError::InvalidEntry {
                    id: product.id.to_string(),
                    reason: "price cannot be negative".to_string(),
                });
            }
            if product.max_quantity == 0 {
                return Err(CatalogError::InvalidEntry {
                    id: product.id.to_string(),
                    reason: "max_quantity must be at least 1".to_string(),
                });
            }
            if let Some(previous) = catalog.products.insert(product.id.clone(), product) {
                return Err(CatalogError::DuplicateProduct(previous.id));
            }
        }

        for discount in discounts {
            discount
                .to_discount()
                .map_err(|e| CatalogError::InvalidEntry {
                    id: discount.code.clone(),
                    reason: e.to_string(),
                })?;
            let key = discount.code.to_uppercase();
            if catalog.discounts.contains_key(&key) {
                return Err(CatalogError::DuplicateDiscount(discount.code));
            }
            catalog.discounts.insert(key, discount);
        }

        Ok(catalog)
    }

    /// Look up a product.
    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Look up an active discount code, ignoring case.
    #[must_use]
    pub fn discount(&self, code: &str) -> Option<&DiscountCode> {
        self.discounts
            .get(&code.trim().to_uppercase())
            .filter(|discount| discount.active)
    }

    /// Products sorted by id.
    #[must_use]
    pub fn products(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.values().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn discount_count(&self) -> usize {
        self.discounts.len()
    }
}
