//! Checkout: reconcile the cart against the catalog, then place an order.
//!
//! Line items keep the name and price they were added with. Before an order
//! is placed every line is checked against the live catalog; any mismatch
//! stops checkout and is reported back so the shopper can review the cart.

use chrono::{DateTime, Utc};
use nexus_core::cart::{CartState, CartStore, CartSummary, LineItem, PricingRules};
use nexus_core::{CustomerTier, OrderId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;

/// A cart line that no longer matches the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub issue: Issue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum Issue {
    /// The product is no longer in the catalog.
    Discontinued,
    OutOfStock,
    /// More units than a single order may contain.
    QuantityExceeded { requested: u32, max: u32 },
    /// The catalog price differs from the price captured in the cart.
    PriceChanged {
        cart_price: Decimal,
        current_price: Decimal,
    },
}

/// Why checkout was refused.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("cart needs review: {} item(s) changed", .0.len())]
    NeedsReview(Vec<Discrepancy>),
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    /// Amounts rounded to the currency's minor unit.
    pub summary: CartSummary,
    pub placed_at: DateTime<Utc>,
}

/// Compare every line with the catalog, as seen by a customer of `tier`.
#[must_use]
pub fn reconcile(cart: &CartState, catalog: &Catalog, tier: CustomerTier) -> Vec<Discrepancy> {
    cart.lines()
        .iter()
        .filter_map(|line| {
            let issue = match catalog.product(line.product_id.as_str()) {
                None => Issue::Discontinued,
                Some(product) if !product.in_stock => Issue::OutOfStock,
                Some(product) if line.quantity > product.max_quantity => Issue::QuantityExceeded {
                    requested: line.quantity,
                    max: product.max_quantity,
                },
                Some(product) => {
                    let current_price = product.price_for(tier);
                    if current_price == line.unit_price {
                        return None;
                    }
                    Issue::PriceChanged {
                        cart_price: line.unit_price,
                        current_price,
                    }
                }
            };
            Some(Discrepancy {
                product_id: line.product_id.clone(),
                issue,
            })
        })
        .collect()
}

/// Place an order for the cart's contents and clear the cart.
///
/// The cart is left untouched if checkout is refused.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart, or
/// `CheckoutError::NeedsReview` if any line disagrees with the catalog.
pub fn place_order(
    cart: &mut CartStore,
    catalog: &Catalog,
    tier: CustomerTier,
    pricing: &PricingRules,
) -> Result<Order, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let discrepancies = reconcile(cart.state(), catalog, tier);
    if !discrepancies.is_empty() {
        return Err(CheckoutError::NeedsReview(discrepancies));
    }

    let order = Order {
        id: OrderId::new_v4(),
        lines: cart.lines().to_vec(),
        discount_code: cart.state().discount().map(|d| d.code.clone()),
        summary: pricing.summarize(cart.state()).rounded(),
        placed_at: Utc::now(),
    };
    cart.clear();

    tracing::info!(
        order_id = %order.id,
        lines = order.lines.len(),
        total = %order.summary.total_price(),
        "Order placed"
    );
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexus_core::cart::{Discount, NewLineItem};

    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{"products": [
                {"id": "screen", "name": "Screen", "price": "100.00", "max_quantity": 3},
                {"id": "glue", "name": "Glue", "price": "5.00"},
                {"id": "tool", "name": "Tool", "price": "20.00", "in_stock": false}
            ]}"#,
        )
        .unwrap()
    }

    fn add(cart: &mut CartStore, id: &str, price: Decimal, quantity: u32) {
        cart.add_quantity(NewLineItem::new(id, id, price), quantity)
            .unwrap();
    }

    #[test]
    fn test_reconcile_clean_cart() {
        let mut cart = CartStore::new();
        add(&mut cart, "screen", Decimal::new(100, 0), 1);
        add(&mut cart, "glue", Decimal::new(5, 0), 2);
        assert!(reconcile(cart.state(), &catalog(), CustomerTier::Retail).is_empty());
    }

    #[test]
    fn test_reconcile_reports_each_issue() {
        let mut cart = CartStore::new();
        add(&mut cart, "screen", Decimal::new(100, 0), 4);
        add(&mut cart, "glue", Decimal::new(4, 0), 1);
        add(&mut cart, "tool", Decimal::new(20, 0), 1);
        add(&mut cart, "gone", Decimal::new(1, 0), 1);

        let issues: Vec<Issue> = reconcile(cart.state(), &catalog(), CustomerTier::Retail)
            .into_iter()
            .map(|d| d.issue)
            .collect();
        assert_eq!(
            issues,
            vec![
                Issue::QuantityExceeded {
                    requested: 4,
                    max: 3
                },
                Issue::PriceChanged {
                    cart_price: Decimal::new(4, 0),
                    current_price: Decimal::new(5, 0),
                },
                Issue::OutOfStock,
                Issue::Discontinued,
            ]
        );
    }

    #[test]
    fn test_reconcile_uses_tier_price() {
        let mut cart = CartStore::new();
        add(&mut cart, "glue", Decimal::new(425, 2), 1);
        assert!(reconcile(cart.state(), &catalog(), CustomerTier::Wholesale).is_empty());
        assert_eq!(
            reconcile(cart.state(), &catalog(), CustomerTier::Retail).len(),
            1
        );
    }

    #[test]
    fn test_place_order_clears_cart() {
        let mut cart = CartStore::new();
        add(&mut cart, "screen", Decimal::new(100, 0), 2);
        cart.apply_discount(Discount::fixed("FIX25", Decimal::new(25, 0)).unwrap())
            .unwrap();

        let order = place_order(
            &mut cart,
            &catalog(),
            CustomerTier::Retail,
            &PricingRules::default(),
        )
        .unwrap();

        assert!(cart.is_empty());
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.discount_code.as_deref(), Some("FIX25"));
        assert_eq!(order.summary.subtotal.to_string(), "200.00");
        assert_eq!(order.summary.shipping.to_string(), "25.00");
        assert_eq!(order.summary.tax.to_string(), "8.75");
        assert_eq!(order.summary.total.to_string(), "208.75");
    }

    #[test]
    fn test_refused_checkout_keeps_cart() {
        let mut cart = CartStore::new();
        assert!(matches!(
            place_order(
                &mut cart,
                &catalog(),
                CustomerTier::Retail,
                &PricingRules::default()
            ),
            Err(CheckoutError::EmptyCart)
        ));

        add(&mut cart, "tool", Decimal::new(20, 0), 1);
        let err = place_order(
            &mut cart,
            &catalog(),
            CustomerTier::Retail,
            &PricingRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::NeedsReview(ref d) if d.len() == 1));
        assert_eq!(cart.quantity_of("tool"), 1);
    }

    #[test]
    fn test_discrepancy_json() {
        let discrepancy = Discrepancy {
            product_id: ProductId::parse("glue").unwrap(),
            issue: Issue::PriceChanged {
                cart_price: Decimal::new(4, 0),
                current_price: Decimal::new(5, 0),
            },
        };
        let value = serde_json::to_value(&discrepancy).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "product_id": "glue",
                "issue": "price_changed",
                "cart_price": "4",
                "current_price": "5"
            })
        );
    }
}
