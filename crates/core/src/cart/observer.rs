//! Change notification for cart observers.
//!
//! Listeners run synchronously, in subscription order, right after the
//! mutation they describe. The registry lock is released before any listener
//! runs, so a listener may subscribe or unsubscribe others.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::CartState;
use crate::types::ProductId;

/// A change that was just applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A product was added; `quantity` is the line's new quantity.
    ItemAdded { product_id: ProductId, quantity: u32 },
    /// A line's quantity was set.
    QuantityUpdated { product_id: ProductId, quantity: u32 },
    /// A line was removed.
    ItemRemoved { product_id: ProductId },
    /// Every line (and any discount) was dropped.
    Cleared,
    DiscountApplied { code: String },
    DiscountRemoved,
    /// Another cart was folded in.
    Merged { added: usize, updated: usize },
}

/// Callback invoked after every effective cart mutation.
pub type Listener = Arc<dyn Fn(&CartEvent, &CartState) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Shared listener list owned by a store.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    registry: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> Subscription {
        let mut registry = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub(crate) fn notify(&self, event: &CartEvent, state: &CartState) {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event, state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

/// Handle returned by [`CartStore::subscribe`](super::CartStore::subscribe).
///
/// The listener stays attached until [`unsubscribe`](Self::unsubscribe) is
/// called or the handle is dropped.
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Detach the listener.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
