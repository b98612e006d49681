//! Discount codes applied to a whole cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartError;

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal, `0..=100`.
    Percentage,
    /// `value` is a fixed amount in the cart currency.
    Fixed,
}

/// A discount applied to the cart subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
}

impl Discount {
    /// Percentage discount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the code is blank or `percent` is outside `0..=100`.
    pub fn percentage(code: impl Into<String>, percent: Decimal) -> Result<Self, CartError> {
        let discount = Self {
            code: code.into(),
            kind: DiscountKind::Percentage,
            value: percent,
        };
        discount.validate()?;
        Ok(discount)
    }

    /// Fixed-amount discount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the code is blank or `amount` is negative.
    pub fn fixed(code: impl Into<String>, amount: Decimal) -> Result<Self, CartError> {
        let discount = Self {
            code: code.into(),
            kind: DiscountKind::Fixed,
            value: amount,
        };
        discount.validate()?;
        Ok(discount)
    }

    /// Check the discount's invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` describing the first violated rule.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.code.trim().is_empty() {
            return Err(CartError::invalid("discount code cannot be empty"));
        }
        if self.value < Decimal::ZERO {
            return Err(CartError::invalid("discount value cannot be negative"));
        }
        if self.kind == DiscountKind::Percentage && self.value > Decimal::ONE_HUNDRED {
            return Err(CartError::invalid(
                "percentage discount cannot exceed 100",
            ));
        }
        Ok(())
    }

    /// Amount taken off `subtotal`, never more than the subtotal itself.
    #[must_use]
    pub fn amount_off(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.kind {
            DiscountKind::Percentage => subtotal.saturating_mul(self.value) / Decimal::ONE_HUNDRED,
            DiscountKind::Fixed => self.value,
        };
        raw.min(subtotal).max(Decimal::ZERO)
    }
}
