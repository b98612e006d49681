//! Cart route handlers.
//!
//! Every handler loads the cart from the session through [`CartSession`],
//! and mutating handlers commit it back before responding. Mutations accept an
//! optional `expected_revision`; a stale value is rejected with `409`.

use axum::{Json, extract::State};
use nexus_core::cart::{
    CartStore, CartSummary, Discount, LineItem, MergeOutcome, MergePolicy, PersistedCart,
};
use nexus_core::{CustomerTier, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::catalog::{Catalog, DiscountCode};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::CartSession;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A cart line with its rounded line total.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    #[serde(flatten)]
    pub item: LineItem,
    pub line_total: Decimal,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<LineView>,
    pub item_count: u64,
    pub revision: u64,
    pub discount: Option<Discount>,
    /// Amounts rounded to the currency's minor unit.
    pub summary: CartSummary,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &CartStore, state: &AppState) -> Self {
        let pricing = state.pricing();
        let items = cart
            .lines()
            .iter()
            .map(|item| LineView {
                line_total: Price::new(item.line_total(), pricing.currency)
                    .rounded()
                    .amount,
                item: item.clone(),
            })
            .collect();

        Self {
            items,
            item_count: cart.item_count(),
            revision: cart.revision(),
            discount: cart.state().discount().cloned(),
            summary: pricing.summarize(cart.state()).rounded(),
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: String,
    pub quantity: i64,
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: String,
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearCartRequest {
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyDiscountRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeCartRequest {
    pub cart: PersistedCart,
    #[serde(default)]
    pub policy: MergePolicy,
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SetTierRequest {
    pub tier: CustomerTier,
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub added: usize,
    pub updated: usize,
    pub discount_adopted: bool,
    pub cart: CartView,
}

/// Reject the request if the cart moved past the revision the client saw.
fn check_revision(cart: &CartStore, expected: Option<u64>) -> Result<()> {
    match expected {
        Some(expected) if expected != cart.revision() => Err(AppError::Conflict(format!(
            "cart is at revision {}, expected {expected}",
            cart.revision()
        ))),
        _ => Ok(()),
    }
}

/// Check an uploaded cart against the catalog.
///
/// Every line must name a known, in-stock product. Lines are re-snapshotted
/// with the catalog's name, images and `tier` price, and the discount is
/// re-read from the catalog (dropped if unknown or inactive).
fn vet_incoming(catalog: &Catalog, tier: CustomerTier, mut incoming: PersistedCart) -> Result<PersistedCart> {
    for line in &mut incoming.items {
        let product = catalog.product(line.product_id.as_str()).ok_or_else(|| {
            AppError::BadRequest(format!("unknown product {}", line.product_id))
        })?;
        if !product.in_stock {
            return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
        }

        let fresh = product.line_item_for(tier);
        line.name = fresh.name;
        line.unit_price = fresh.unit_price;
        line.images = fresh.images;
    }

    incoming.discount = match incoming.discount.take() {
        Some(discount) => catalog
            .discount(&discount.code)
            .map(DiscountCode::to_discount)
            .transpose()?,
        None => None,
    };
    Ok(incoming)
}

/// Reject a merge that would leave an incoming product above its per-order limit.
fn check_merged_limits(catalog: &Catalog, merged: &CartStore, incoming: &PersistedCart) -> Result<()> {
    for line in &incoming.items {
        let Some(product) = catalog.product(line.product_id.as_str()) else {
            continue;
        };
        if merged.quantity_of(product.id.as_str()) > product.max_quantity {
            return Err(AppError::BadRequest(format!(
                "at most {} of {} per order",
                product.max_quantity, product.name
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip(state, cart))]
pub async fn show(State(state): State<AppState>, cart: CartSession) -> Result<Json<CartView>> {
    cart.commit().await?;
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Cart count badge.
#[instrument(skip(cart))]
pub async fn count(cart: CartSession) -> Json<Value> {
    Json(json!({ "count": cart.cart().item_count() }))
}

/// Add a catalog product to the cart.
#[instrument(skip(state, cart))]
pub async fn add(
    State(state): State<AppState>,
    mut cart: CartSession,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }

    let product = state
        .catalog()
        .product(&request.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;
    if !product.in_stock {
        return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
    }

    let in_cart = cart.cart().quantity_of(product.id.as_str());
    if u64::from(in_cart) + u64::from(quantity) > u64::from(product.max_quantity) {
        return Err(AppError::BadRequest(format!(
            "at most {} of {} per order",
            product.max_quantity, product.name
        )));
    }

    let tier = cart.tier().await?;
    cart.cart_mut()
        .add_quantity(product.line_item_for(tier), quantity)?;
    cart.commit().await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", product.id.as_str()), ("tier", &tier.to_string())],
    );
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(state, cart))]
pub async fn update(
    State(state): State<AppState>,
    mut cart: CartSession,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    check_revision(cart.cart(), request.expected_revision)?;

    if let Some(product) = state.catalog().product(&request.product_id) {
        if request.quantity > i64::from(product.max_quantity) {
            return Err(AppError::BadRequest(format!(
                "at most {} of {} per order",
                product.max_quantity, product.name
            )));
        }
    }

    cart.cart_mut()
        .update_quantity(&request.product_id, request.quantity)?;
    cart.commit().await?;
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Remove a line. Removing a product that is not in the cart succeeds.
#[instrument(skip(state, cart))]
pub async fn remove(
    State(state): State<AppState>,
    mut cart: CartSession,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    check_revision(cart.cart(), request.expected_revision)?;
    cart.cart_mut().remove_from_cart(&request.product_id);
    cart.commit().await?;
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Empty the cart.
#[instrument(skip(state, cart))]
pub async fn clear(
    State(state): State<AppState>,
    mut cart: CartSession,
    Json(request): Json<ClearCartRequest>,
) -> Result<Json<CartView>> {
    check_revision(cart.cart(), request.expected_revision)?;
    cart.cart_mut().clear();
    cart.commit().await?;
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Apply a discount code from the catalog.
#[instrument(skip(state, cart))]
pub async fn apply_discount(
    State(state): State<AppState>,
    mut cart: CartSession,
    Json(request): Json<ApplyDiscountRequest>,
) -> Result<Json<CartView>> {
    let code = state
        .catalog()
        .discount(&request.code)
        .ok_or_else(|| AppError::NotFound(format!("discount code {}", request.code.trim())))?;

    cart.cart_mut().apply_discount(code.to_discount()?)?;
    cart.commit().await?;
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Drop the applied discount, if any.
#[instrument(skip(state, cart))]
pub async fn remove_discount(
    State(state): State<AppState>,
    mut cart: CartSession,
) -> Result<Json<CartView>> {
    cart.cart_mut().remove_discount();
    cart.commit().await?;
    Ok(Json(CartView::new(cart.cart(), &state)))
}

/// Fold a cart exported from another tab or device into this one.
///
/// The uploaded lines are held to the same catalog rules as `add`: unknown
/// and out-of-stock products are rejected, prices come from the catalog, and
/// the merged quantity may not pass `max_quantity`.
#[instrument(skip(state, cart, request))]
pub async fn merge(
    State(state): State<AppState>,
    mut cart: CartSession,
    Json(request): Json<MergeCartRequest>,
) -> Result<Json<MergeResponse>> {
    check_revision(cart.cart(), request.expected_revision)?;

    let tier = cart.tier().await?;
    let vetted = vet_incoming(state.catalog(), tier, request.cart)?;
    let incoming = vetted
        .clone()
        .into_state()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut preview = CartStore::from_state(cart.cart().state().clone());
    preview.merge(&incoming, request.policy)?;
    check_merged_limits(state.catalog(), &preview, &vetted)?;

    let MergeOutcome {
        added,
        updated,
        discount_adopted,
    } = cart.cart_mut().merge(&incoming, request.policy)?;
    cart.commit().await?;

    Ok(Json(MergeResponse {
        added,
        updated,
        discount_adopted,
        cart: CartView::new(cart.cart(), &state),
    }))
}

/// The cart in its persisted form.
#[instrument(skip(cart))]
pub async fn snapshot(cart: CartSession) -> Json<PersistedCart> {
    Json(cart.cart().snapshot())
}

/// Current pricing tier.
#[instrument(skip(cart))]
pub async fn tier(cart: CartSession) -> Result<Json<Value>> {
    let tier = cart.tier().await?;
    Ok(Json(json!({ "tier": tier })))
}

/// Change the pricing tier used for later adds.
#[instrument(skip(cart))]
pub async fn set_tier(cart: CartSession, Json(request): Json<SetTierRequest>) -> Result<Json<Value>> {
    cart.set_tier(request.tier).await?;
    Ok(Json(json!({ "tier": request.tier })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexus_core::cart::NewLineItem;

    use super::*;
    use crate::catalog::Catalog;
    use crate::config::StorefrontConfig;

    #[test]
    fn test_check_revision() {
        let mut cart = CartStore::new();
        cart.add_to_cart(NewLineItem::new("p1", "Case", Decimal::ONE))
            .unwrap();

        assert!(check_revision(&cart, None).is_ok());
        assert!(check_revision(&cart, Some(1)).is_ok());
        assert!(matches!(
            check_revision(&cart, Some(0)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_cart_view_rounds_amounts() {
        let state = AppState::new(StorefrontConfig::default(), Catalog::default());
        let mut cart = CartStore::new();
        cart.add_quantity(NewLineItem::new("p1", "Shim", Decimal::new(3333, 3)), 3)
            .unwrap();

        let view = CartView::new(&cart, &state);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.revision, 1);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items.first().unwrap().line_total.to_string(), "10.00");
        assert_eq!(view.summary.subtotal.to_string(), "10.00");
        assert!(view.discount.is_none());
    }
}
