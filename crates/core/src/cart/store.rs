//! The cart store: validated mutations plus synchronous change notification.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use super::observer::Listeners;
use super::{
    CartError, CartEvent, CartState, Discount, LineItem, MergeOutcome, MergePolicy, NewLineItem,
    PersistedCart, SnapshotError, Subscription,
};
use crate::types::ProductId;

/// Shopping cart for one session.
///
/// A store is constructed per session (or per request, from the session's
/// persisted snapshot) and passed by reference to whatever needs it. It has
/// a single writer; every mutation takes `&mut self` and completes
/// synchronously.
///
/// # Example
///
/// ```
/// use nexus_core::cart::{CartStore, NewLineItem};
/// use rust_decimal::Decimal;
///
/// let mut cart = CartStore::new();
/// cart.add_to_cart(NewLineItem::new("p1", "Case", Decimal::new(999, 2))).unwrap();
/// cart.add_to_cart(NewLineItem::new("p1", "Case", Decimal::new(999, 2))).unwrap();
/// cart.add_to_cart(NewLineItem::new("p2", "Cable", Decimal::new(499, 2))).unwrap();
///
/// assert_eq!(cart.item_count(), 3);
/// assert_eq!(cart.total(), Decimal::new(2497, 2));
/// ```
#[derive(Default)]
pub struct CartStore {
    state: CartState,
    listeners: Listeners,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing state.
    #[must_use]
    pub fn from_state(state: CartState) -> Self {
        Self {
            state,
            listeners: Listeners::default(),
        }
    }

    /// Rebuild a cart from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the snapshot breaks a cart invariant or
    /// was written by a newer schema.
    pub fn restore(persisted: PersistedCart) -> Result<Self, SnapshotError> {
        Ok(Self::from_state(persisted.into_state()?))
    }

    /// Persistable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PersistedCart {
        PersistedCart::from(&self.state)
    }

    /// Read-only view of the current state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product.
    ///
    /// A product already in the cart has its quantity incremented and keeps
    /// the name, price and images captured on its first add. Returns the
    /// line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed product id or a negative price.
    pub fn add_to_cart(&mut self, item: NewLineItem) -> Result<u32, CartError> {
        self.add_quantity(item, 1)
    }

    /// Add `quantity` units of a product. See [`add_to_cart`](Self::add_to_cart).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed product id, a negative price,
    /// a zero quantity, a quantity that would overflow, or a subtotal that
    /// would pass [`MAX_CART_TOTAL`](super::MAX_CART_TOTAL).
    pub fn add_quantity(&mut self, item: NewLineItem, quantity: u32) -> Result<u32, CartError> {
        let product_id = ProductId::parse(&item.product_id)?;
        if quantity == 0 {
            return Err(CartError::invalid("quantity to add must be at least 1"));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(CartError::invalid("unit price cannot be negative"));
        }

        let new_quantity = self.state.add(
            product_id.clone(),
            item.name,
            item.unit_price,
            item.images,
            quantity,
            Utc::now(),
        )?;

        self.emit(&CartEvent::ItemAdded {
            product_id,
            quantity: new_quantity,
        });
        Ok(new_quantity)
    }

    /// Remove a product's line. Removing an absent product is a no-op.
    pub fn remove_from_cart(&mut self, product_id: &str) -> Option<LineItem> {
        let removed = self.state.remove(product_id)?;
        self.emit(&CartEvent::ItemRemoved {
            product_id: removed.product_id.clone(),
        });
        Some(removed)
    }

    /// Set a product's quantity exactly.
    ///
    /// `0` removes the line. Updating a product that is not in the cart is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `quantity` is negative or too large, or if
    /// the new subtotal would pass [`MAX_CART_TOTAL`](super::MAX_CART_TOTAL);
    /// the cart is left unchanged.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        if quantity < 0 {
            return Err(CartError::invalid(format!(
                "quantity must not be negative (got {quantity})"
            )));
        }
        if quantity == 0 {
            self.remove_from_cart(product_id);
            return Ok(());
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| CartError::invalid(format!("quantity {quantity} is too large")))?;

        if self.state.set_quantity(product_id, quantity, Utc::now())? {
            if let Some(item) = self.state.get(product_id) {
                let event = CartEvent::QuantityUpdated {
                    product_id: item.product_id.clone(),
                    quantity,
                };
                self.emit(&event);
            }
        }
        Ok(())
    }

    /// Empty the cart, dropping any discount.
    pub fn clear(&mut self) {
        if self.state.clear() {
            self.emit(&CartEvent::Cleared);
        }
    }

    /// Apply a discount, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the discount is malformed.
    pub fn apply_discount(&mut self, discount: Discount) -> Result<(), CartError> {
        discount.validate()?;
        let code = discount.code.clone();
        if self.state.set_discount(Some(discount)) {
            self.emit(&CartEvent::DiscountApplied { code });
        }
        Ok(())
    }

    /// Remove the applied discount, if any.
    pub fn remove_discount(&mut self) -> Option<Discount> {
        let previous = self.state.discount().cloned()?;
        self.state.set_discount(None);
        self.emit(&CartEvent::DiscountRemoved);
        Some(previous)
    }

    /// Fold another cart into this one.
    ///
    /// The merge is all-or-nothing: on error this cart is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if summing quantities would overflow or the
    /// merged subtotal would pass [`MAX_CART_TOTAL`](super::MAX_CART_TOTAL).
    pub fn merge(&mut self, incoming: &CartState, policy: MergePolicy) -> Result<MergeOutcome, CartError> {
        let mut next = self.state.clone();
        let outcome = next.merge_from(incoming, policy, Utc::now())?;
        if outcome.changed() {
            self.state = next;
            self.emit(&CartEvent::Merged {
                added: outcome.added,
                updated: outcome.updated,
            });
        }
        Ok(outcome)
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a listener called after every effective mutation.
    ///
    /// The listener receives the event and the state after the change.
    /// Operations that change nothing (removing an absent product, clearing
    /// an empty cart) do not notify.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartEvent, &CartState) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    fn emit(&self, event: &CartEvent) {
        self.listeners.notify(event, &self.state);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Exact sum of `unit_price * quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state.total()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.item_count()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.state.quantity_of(product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.state.contains(product_id)
    }

    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        self.state.lines()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.state.revision()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
