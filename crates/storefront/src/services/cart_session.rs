//! Session-backed cart.
//!
//! Each request loads the visitor's cart from the session, mutates it through
//! [`CartStore`], and writes it back only if a listener saw a change.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nexus_core::CustomerTier;
use nexus_core::cart::{CartStore, PersistedCart, SnapshotError, Subscription};
use thiserror::Error;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// The session store could not be read or written.
#[derive(Debug, Error)]
#[error("session store error: {0}")]
pub struct PersistenceError(#[from] tower_sessions::session::Error);

/// The visitor's cart for the duration of one request.
pub struct CartSession {
    session: Session,
    store: CartStore,
    dirty: Arc<AtomicBool>,
    _subscription: Subscription,
}

impl CartSession {
    /// Load the cart stored in `session`.
    ///
    /// A missing cart starts empty. A stored cart that cannot be restored is
    /// logged, replaced with an empty cart, and overwritten on the next commit.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the session store cannot be read.
    pub async fn load(session: Session) -> Result<Self, PersistenceError> {
        let stored = session
            .get::<serde_json::Value>(session_keys::CART)
            .await?;

        let (store, corrupt) = match stored {
            None => (CartStore::new(), false),
            Some(value) => match restore(value) {
                Ok(store) => (store, false),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable cart from session");
                    (CartStore::new(), true)
                }
            },
        };

        let dirty = Arc::new(AtomicBool::new(corrupt));
        let flag = Arc::clone(&dirty);
        let subscription = store.subscribe(move |event, state| {
            tracing::debug!(?event, revision = state.revision(), "Cart changed");
            flag.store(true, Ordering::Relaxed);
        });

        Ok(Self {
            session,
            store,
            dirty,
            _subscription: subscription,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.store
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.store
    }

    /// Whether the cart changed since it was loaded.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Write the cart back to the session if it changed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the session store cannot be written.
    pub async fn commit(&self) -> Result<(), PersistenceError> {
        if !self.is_dirty() {
            return Ok(());
        }
        self.session
            .insert(session_keys::CART, self.store.snapshot())
            .await?;
        self.dirty.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// The customer's pricing tier. Retail unless set.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the session store cannot be read.
    pub async fn tier(&self) -> Result<CustomerTier, PersistenceError> {
        let tier = self
            .session
            .get::<CustomerTier>(session_keys::CUSTOMER_TIER)
            .await?;
        Ok(tier.unwrap_or_default())
    }

    /// Change the customer's pricing tier.
    ///
    /// Lines already in the cart keep the price they were added at.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the session store cannot be written.
    pub async fn set_tier(&self, tier: CustomerTier) -> Result<(), PersistenceError> {
        self.session
            .insert(session_keys::CUSTOMER_TIER, tier)
            .await?;
        Ok(())
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

fn restore(value: serde_json::Value) -> Result<CartStore, SnapshotError> {
    let persisted: PersistedCart = serde_json::from_value(value)?;
    CartStore::restore(persisted)
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        Ok(Self::load(session).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexus_core::cart::NewLineItem;
    use rust_decimal::Decimal;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_empty_session_starts_clean() {
        let cart = CartSession::load(session()).await.unwrap();
        assert!(cart.cart().is_empty());
        assert!(!cart.is_dirty());
    }

    #[tokio::test]
    async fn test_commit_only_after_change() {
        let session = session();

        let mut cart = CartSession::load(session.clone()).await.unwrap();
        cart.commit().await.unwrap();
        assert!(
            session
                .get::<serde_json::Value>(session_keys::CART)
                .await
                .unwrap()
                .is_none()
        );

        cart.cart_mut()
            .add_quantity(NewLineItem::new("p1", "Case", Decimal::new(999, 2)), 2)
            .unwrap();
        assert!(cart.is_dirty());
        cart.commit().await.unwrap();
        assert!(!cart.is_dirty());

        let reloaded = CartSession::load(session).await.unwrap();
        assert_eq!(reloaded.cart().quantity_of("p1"), 2);
        assert_eq!(reloaded.cart().revision(), 1);
    }

    #[tokio::test]
    async fn test_noop_mutation_is_not_dirty() {
        let mut cart = CartSession::load(session()).await.unwrap();
        assert!(cart.cart_mut().remove_from_cart("missing").is_none());
        cart.cart_mut().clear();
        assert!(!cart.is_dirty());
    }

    #[tokio::test]
    async fn test_corrupt_cart_is_replaced() {
        let session = session();
        session
            .insert(session_keys::CART, json!({"schema_version": 99, "items": []}))
            .await
            .unwrap();

        let cart = CartSession::load(session.clone()).await.unwrap();
        assert!(cart.cart().is_empty());
        assert!(cart.is_dirty());

        cart.commit().await.unwrap();
        let stored: PersistedCart = session.get(session_keys::CART).await.unwrap().unwrap();
        assert_eq!(stored.schema_version, nexus_core::cart::SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_tier_defaults_to_retail() {
        let cart = CartSession::load(session()).await.unwrap();
        assert_eq!(cart.tier().await.unwrap(), CustomerTier::Retail);

        cart.set_tier(CustomerTier::Wholesale).await.unwrap();
        assert_eq!(cart.tier().await.unwrap(), CustomerTier::Wholesale);
    }
}
