//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use nexus_core::CustomerTier;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::catalog::Product;
use crate::error::{AppError, Result};
use crate::services::CartSession;
use crate::state::AppState;

/// A product with the price the current customer pays.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub tier: CustomerTier,
    pub tier_price: Decimal,
}

impl ProductView {
    fn new(product: &Product, tier: CustomerTier) -> Self {
        Self {
            product: product.clone(),
            tier,
            tier_price: product.price_for(tier),
        }
    }
}

/// List the catalog.
#[instrument(skip(state, cart))]
pub async fn index(
    State(state): State<AppState>,
    cart: CartSession,
) -> Result<Json<Vec<ProductView>>> {
    let tier = cart.tier().await?;
    let products = state
        .catalog()
        .products()
        .into_iter()
        .map(|product| ProductView::new(product, tier))
        .collect();
    Ok(Json(products))
}

/// Show one product.
#[instrument(skip(state, cart))]
pub async fn show(
    State(state): State<AppState>,
    cart: CartSession,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state
        .catalog()
        .product(&id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let tier = cart.tier().await?;
    Ok(Json(ProductView::new(product, tier)))
}
