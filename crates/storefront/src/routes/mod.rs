//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Health check
//!
//! # Catalog
//! GET    /products             - Product listing (with tier prices)
//! GET    /products/{id}        - Product detail
//!
//! # Cart (JSON)
//! GET    /cart                 - Cart lines and summary
//! GET    /cart/count           - Item count badge
//! POST   /cart/add             - Add a product
//! POST   /cart/update          - Set a line's quantity
//! POST   /cart/remove          - Remove a line
//! POST   /cart/clear           - Empty the cart
//! POST   /cart/discount        - Apply a discount code
//! DELETE /cart/discount        - Remove the discount
//! POST   /cart/merge           - Merge a cart from another tab or device
//! GET    /cart/snapshot        - Export the persisted cart
//! GET    /cart/tier            - Current pricing tier
//! POST   /cart/tier            - Change pricing tier
//!
//! # Checkout
//! POST   /checkout             - Reconcile and place the order
//! GET    /checkout/last-order  - Most recent order in this session
//! ```

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route(
            "/discount",
            post(cart::apply_discount).delete(cart::remove_discount),
        )
        .route("/merge", post(cart::merge))
        .route("/snapshot", get(cart::snapshot))
        .route("/tier", get(cart::tier).post(cart::set_tier))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .route("/last-order", get(checkout::last_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}

/// Build the application with sessions, tracing and request IDs.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
