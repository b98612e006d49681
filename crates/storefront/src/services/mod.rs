//! Business logic services for storefront.
//!
//! - `cart_session` - Cart loaded from and saved to the session
//! - `checkout` - Reconciliation against the catalog and order placement

pub mod cart_session;
pub mod checkout;

pub use cart_session::{CartSession, PersistenceError};
pub use checkout::{CheckoutError, Discrepancy, Issue, Order};
