//! Session-related types.
//!
//! The cart lives in the session as a `PersistedCart` JSON value.

/// Session keys for storefront data.
pub mod keys {
    /// Key for the persisted cart.
    pub const CART: &str = "cart";

    /// Key for the most recently placed order.
    pub const LAST_ORDER: &str = "last_order";

    /// Key for the customer's pricing tier.
    pub const CUSTOMER_TIER: &str = "customer_tier";
}
