//! Folding one cart into another.
//!
//! Used when a guest cart meets a signed-in cart, or when a second browser
//! tab uploads its own copy of the cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CartError, CartState};

/// How quantities of a product present in both carts are combined.
///
/// The receiving cart's snapshot (name, price, images) is kept for shared
/// products under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Add the incoming quantity to the existing one.
    #[default]
    SumQuantities,
    /// Keep the quantity of whichever line changed last.
    LastWriteWins,
}

/// What a merge changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Lines appended from the incoming cart.
    pub added: usize,
    /// Existing lines whose quantity changed.
    pub updated: usize,
    /// Whether the incoming discount was adopted.
    pub discount_adopted: bool,
}

impl MergeOutcome {
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0 || self.discount_adopted
    }
}

impl CartState {
    /// Fold `incoming` into `self`.
    ///
    /// Products only in `incoming` are appended in their incoming order. The
    /// incoming discount is adopted only when `self` has none. The revision
    /// is bumped once if anything changed. Lines whose quantity is summed are
    /// stamped with `now`.
    ///
    /// On error `self` may be partially merged; callers work on a copy.
    pub(crate) fn merge_from(
        &mut self,
        incoming: &Self,
        policy: MergePolicy,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, CartError> {
        let mut outcome = MergeOutcome::default();

        for line in incoming.lines() {
            let existing = self
                .items_mut()
                .iter_mut()
                .find(|item| item.product_id == line.product_id);

            match existing {
                Some(item) => {
                    let (quantity, updated_at) = match policy {
                        MergePolicy::SumQuantities => {
                            let quantity =
                                item.quantity.checked_add(line.quantity).ok_or_else(|| {
                                    CartError::invalid(format!(
                                        "quantity overflow merging {}",
                                        line.product_id
                                    ))
                                })?;
                            (quantity, now)
                        }
                        MergePolicy::LastWriteWins if line.updated_at > item.updated_at => {
                            (line.quantity, line.updated_at)
                        }
                        MergePolicy::LastWriteWins => (item.quantity, item.updated_at),
                    };

                    if quantity != item.quantity {
                        outcome.updated += 1;
                    }
                    item.quantity = quantity;
                    item.updated_at = updated_at;
                }
                None => {
                    self.items_mut().push(line.clone());
                    outcome.added += 1;
                }
            }
        }

        self.ensure_within_limit()?;

        let discount = self.discount_mut();
        if discount.is_none() {
            if let Some(incoming_discount) = incoming.discount() {
                *discount = Some(incoming_discount.clone());
                outcome.discount_adopted = true;
            }
        }

        if outcome.changed() {
            self.bump_revision();
        }

        Ok(outcome)
    }
}
