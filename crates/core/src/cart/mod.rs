//! Shopping cart for a single session.
//!
//! [`CartStore`] holds an ordered set of [`LineItem`]s, unique by product
//! id, and exposes add, remove, update, clear, total and count. Observers
//! registered with [`CartStore::subscribe`] are told about every change
//! synchronously. A store can be turned into a [`PersistedCart`] and back;
//! persisting it is up to the caller.
//!
//! # Money
//!
//! Prices and totals use [`rust_decimal::Decimal`] and are never rounded
//! mid-computation. [`PricingRules`] derives discount, shipping and tax;
//! [`CartSummary::rounded`] rounds half-up for display.

mod discount;
mod error;
mod line_item;
mod merge;
mod observer;
mod pricing;
mod snapshot;
mod state;
mod store;

pub use discount::{Discount, DiscountKind};
pub use error::{CartError, SnapshotError};
pub use line_item::{LineItem, NewLineItem};
pub use merge::{MergeOutcome, MergePolicy};
pub use observer::{CartEvent, Listener, Subscription};
pub use pricing::{CartSummary, PricingRules};
pub use snapshot::{PersistedCart, SCHEMA_VERSION};
pub use state::{CartState, MAX_CART_TOTAL};
pub use store::CartStore;
