//! Cart summary: discount, shipping, tax and grand total.
//!
//! All amounts are exact. [`CartSummary::rounded`] rounds each figure half-up
//! to the currency's minor unit for display or charging.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartState;
use crate::types::{CurrencyCode, Price};

/// Store-wide pricing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    pub currency: CurrencyCode,
    /// Tax rate as a fraction (`0.05` is 5%).
    pub tax_rate: Decimal,
    /// Shipping charged below the free-shipping threshold.
    pub shipping_flat: Decimal,
    /// Discounted subtotal at which shipping becomes free. `None` disables.
    pub free_shipping_threshold: Option<Decimal>,
}

impl Default for PricingRules {
    /// AED with 5% VAT, 25 flat shipping, free from 200.
    fn default() -> Self {
        Self {
            currency: CurrencyCode::AED,
            tax_rate: Decimal::new(5, 2),
            shipping_flat: Decimal::new(25, 0),
            free_shipping_threshold: Some(Decimal::new(200, 0)),
        }
    }
}

/// Money breakdown of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub currency: CurrencyCode,
    pub item_count: u64,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl PricingRules {
    /// Compute the summary for `cart`.
    #[must_use]
    pub fn summarize(&self, cart: &CartState) -> CartSummary {
        let subtotal = cart.total();
        let discount = cart
            .discount()
            .map_or(Decimal::ZERO, |d| d.amount_off(subtotal));
        let taxable = subtotal - discount;

        let shipping = if cart.is_empty() {
            Decimal::ZERO
        } else {
            match self.free_shipping_threshold {
                Some(threshold) if taxable >= threshold => Decimal::ZERO,
                _ => self.shipping_flat,
            }
        };

        let tax = taxable.saturating_mul(self.tax_rate);

        CartSummary {
            currency: self.currency,
            item_count: cart.item_count(),
            subtotal,
            discount,
            shipping,
            tax,
            total: taxable.saturating_add(shipping).saturating_add(tax),
        }
    }
}

impl CartSummary {
    /// Every amount rounded half-up to the currency's minor unit.
    ///
    /// `total` is rounded from the exact total, not summed from rounded parts.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let round = |amount: Decimal| Price::new(amount, self.currency).rounded().amount;
        Self {
            currency: self.currency,
            item_count: self.item_count,
            subtotal: round(self.subtotal),
            discount: round(self.discount),
            shipping: round(self.shipping),
            tax: round(self.tax),
            total: round(self.total),
        }
    }

    /// The grand total as a [`Price`].
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::new(self.total, self.currency)
    }
}
