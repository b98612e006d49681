//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::{CartSession, Order, PersistenceError, checkout};
use crate::state::AppState;

/// Reconcile the cart with the catalog and place an order.
///
/// The order is recorded in the session before the cleared cart is saved, so
/// a failed write leaves the cart as it was.
#[instrument(skip(state, cart))]
pub async fn place_order(
    State(state): State<AppState>,
    mut cart: CartSession,
) -> Result<(StatusCode, Json<Order>)> {
    let tier = cart.tier().await?;
    let order = checkout::place_order(cart.cart_mut(), state.catalog(), tier, state.pricing())?;

    cart.session()
        .insert(session_keys::LAST_ORDER, &order)
        .await
        .map_err(PersistenceError::from)?;
    cart.commit().await?;

    add_breadcrumb("checkout", "Order placed", &[("order_id", &order.id.to_string())]);
    Ok((StatusCode::CREATED, Json(order)))
}

/// The most recent order placed in this session.
#[instrument(skip(cart))]
pub async fn last_order(cart: CartSession) -> Result<Json<Order>> {
    let order = cart
        .session()
        .get::<Order>(session_keys::LAST_ORDER)
        .await
        .map_err(PersistenceError::from)?
        .ok_or_else(|| AppError::NotFound("no order placed yet".to_string()))?;
    Ok(Json(order))
}
