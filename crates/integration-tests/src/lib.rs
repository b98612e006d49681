//! Integration tests for Nexus.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nexus-integration-tests
//! ```
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`
//! over an in-memory session store, so no database or network is needed.
//! [`TestClient`] carries the session cookie between requests like a browser.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use nexus_storefront::catalog::Catalog;
use nexus_storefront::config::StorefrontConfig;
use nexus_storefront::middleware::create_session_layer;
use nexus_storefront::routes;
use nexus_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Catalog used by most tests.
pub const TEST_CATALOG: &str = r#"{
    "products": [
        {"id": "screen", "name": "OLED Screen", "price": "100.00", "max_quantity": 3},
        {"id": "case", "name": "Case", "price": "9.99"},
        {"id": "cable", "name": "Cable", "price": "4.99"},
        {"id": "tool", "name": "Heat Gun", "price": "60.00", "in_stock": false}
    ],
    "discounts": [
        {"code": "SAVE10", "kind": "percentage", "value": "10"}
    ]
}"#;

/// An HTTP client bound to one browser session.
pub struct TestClient {
    store: MemoryStore,
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    /// A fresh visitor against [`TEST_CATALOG`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(TEST_CATALOG)
    }

    /// A fresh visitor against `catalog_json`.
    #[must_use]
    pub fn with_catalog(catalog_json: &str) -> Self {
        let store = MemoryStore::default();
        let app = build_app(store.clone(), catalog_json);
        Self {
            store,
            app,
            cookie: None,
        }
    }

    /// Swap the catalog while keeping the session, as after a price update.
    pub fn replace_catalog(&mut self, catalog_json: &str) {
        self.app = build_app(self.store.clone(), catalog_json);
    }

    /// Forget the session cookie, as a second browser would.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            store: self.store.clone(),
            app: self.app.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> (StatusCode, Value) {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, None).await
    }

    /// Send a request and decode the JSON response (`Null` for an empty body).
    pub async fn send(&mut self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().expect("ascii cookie");
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_app(store: MemoryStore, catalog_json: &str) -> Router {
    let config = StorefrontConfig::default();
    let catalog = Catalog::from_json(catalog_json).expect("valid test catalog");
    let session_layer = create_session_layer(store, &config);
    routes::app(AppState::new(config, catalog), session_layer)
}
