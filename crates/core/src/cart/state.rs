//! The cart's data: ordered, unique line items plus an optional discount.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{CartError, Discount, LineItem};
use crate::types::ProductId;

/// Largest subtotal a cart may hold (one trillion).
///
/// Discount, shipping and tax computed from a subtotal within this bound
/// stay inside `Decimal`'s range.
pub const MAX_CART_TOTAL: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Exact sum of `unit_price * quantity` over `lines`, or `None` if it would
/// overflow or pass [`MAX_CART_TOTAL`].
pub(crate) fn checked_subtotal<I>(lines: I) -> Option<Decimal>
where
    I: IntoIterator<Item = (Decimal, u32)>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, (unit_price, quantity)| {
            let line = unit_price.checked_mul(Decimal::from(quantity))?;
            sum.checked_add(line).filter(|total| *total <= MAX_CART_TOTAL)
        })
}

pub(crate) fn over_limit() -> CartError {
    CartError::invalid(format!("cart total would exceed {MAX_CART_TOTAL}"))
}

/// Ordered collection of line items, unique by product id.
///
/// Lines keep the order in which their product was first added. Carts are
/// small, so lookups are linear scans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    items: Vec<LineItem>,
    discount: Option<Discount>,
    revision: u64,
}

impl CartState {
    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.items
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == *product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.get(product_id).is_some()
    }

    /// Quantity of one product, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.get(product_id).map_or(0, |item| item.quantity)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities, for a cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Exact sum of `unit_price * quantity` over all lines.
    ///
    /// Never above [`MAX_CART_TOTAL`]; every mutation that would pass it is
    /// rejected.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()))
    }

    #[must_use]
    pub const fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    /// Mutation counter, bumped once per effective change.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn from_parts(items: Vec<LineItem>, discount: Option<Discount>, revision: u64) -> Self {
        Self {
            items,
            discount,
            revision,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<LineItem>, Option<Discount>, u64) {
        (self.items, self.discount, self.revision)
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id == *product_id)
    }

    fn get_mut(&mut self, product_id: &str) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == *product_id)
    }

    /// Subtotal with `product_id` set to `quantity` units at `unit_price`.
    fn subtotal_with(&self, product_id: &str, unit_price: Decimal, quantity: u32) -> Option<Decimal> {
        let others = self
            .items
            .iter()
            .filter(|item| item.product_id != *product_id)
            .map(|item| (item.unit_price, item.quantity));
        checked_subtotal(others.chain(std::iter::once((unit_price, quantity))))
    }

    /// Fails if the current lines pass [`MAX_CART_TOTAL`].
    pub(crate) fn ensure_within_limit(&self) -> Result<(), CartError> {
        checked_subtotal(self.items.iter().map(|item| (item.unit_price, item.quantity)))
            .map(|_| ())
            .ok_or_else(over_limit)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Add `by` units, inserting a new line at the end when the product is new.
    ///
    /// Returns the line's resulting quantity.
    pub(crate) fn add(
        &mut self,
        product_id: ProductId,
        name: String,
        unit_price: Decimal,
        images: Vec<String>,
        by: u32,
        now: DateTime<Utc>,
    ) -> Result<u32, CartError> {
        let (line_price, quantity) = match self.get(product_id.as_str()) {
            Some(item) => {
                let quantity = item
                    .quantity
                    .checked_add(by)
                    .ok_or_else(|| CartError::invalid("quantity overflow"))?;
                (item.unit_price, quantity)
            }
            None => (unit_price, by),
        };
        if self
            .subtotal_with(product_id.as_str(), line_price, quantity)
            .is_none()
        {
            return Err(over_limit());
        }

        if let Some(item) = self.get_mut(product_id.as_str()) {
            item.quantity = quantity;
            item.updated_at = now;
            self.touch();
            return Ok(quantity);
        }

        self.items.push(LineItem {
            product_id,
            name,
            unit_price,
            quantity: by,
            images,
            added_at: now,
            updated_at: now,
        });
        self.touch();
        Ok(by)
    }

    /// Set a line's quantity. Returns `false` when the product is absent or
    /// already has that quantity.
    pub(crate) fn set_quantity(
        &mut self,
        product_id: &str,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<bool, CartError> {
        debug_assert!(quantity > 0);
        let Some(item) = self.get(product_id) else {
            return Ok(false);
        };
        if item.quantity == quantity {
            return Ok(false);
        }
        if self
            .subtotal_with(product_id, item.unit_price, quantity)
            .is_none()
        {
            return Err(over_limit());
        }
        if let Some(item) = self.get_mut(product_id) {
            item.quantity = quantity;
            item.updated_at = now;
        }
        self.touch();
        Ok(true)
    }

    pub(crate) fn remove(&mut self, product_id: &str) -> Option<LineItem> {
        let index = self.position(product_id)?;
        let removed = self.items.remove(index);
        self.touch();
        Some(removed)
    }

    /// Drop every line and the discount. Returns `false` if already empty.
    pub(crate) fn clear(&mut self) -> bool {
        if self.items.is_empty() && self.discount.is_none() {
            return false;
        }
        self.items.clear();
        self.discount = None;
        self.touch();
        true
    }

    pub(crate) fn set_discount(&mut self, discount: Option<Discount>) -> bool {
        if self.discount == discount {
            return false;
        }
        self.discount = discount;
        self.touch();
        true
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<LineItem> {
        &mut self.items
    }

    pub(crate) fn discount_mut(&mut self) -> &mut Option<Discount> {
        &mut self.discount
    }

    pub(crate) fn bump_revision(&mut self) {
        self.touch();
    }
}
