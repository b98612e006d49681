//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nexus_core::cart::CartError;
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::services::checkout::{CheckoutError, Discrepancy};
use crate::services::PersistenceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// The cart rejected an operation.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The session store could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The cart changed since the client last read it.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The cart no longer matches the catalog.
    #[error("Cart needs review: {} item(s) changed", .0.len())]
    Reconciliation(Vec<Discrepancy>),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Catalog(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::Reconciliation(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::BadRequest("cart is empty".to_string()),
            CheckoutError::NeedsReview(discrepancies) => Self::Reconciliation(discrepancies),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Persistence(_) | Self::Catalog(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Persistence(_) => json!({ "error": "Cart storage unavailable, please retry" }),
            Self::Catalog(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Reconciliation(discrepancies) => json!({
                "error": "Cart needs review",
                "discrepancies": discrepancies,
            }),
            Self::Cart(CartError::InvalidArgument(message))
            | Self::NotFound(message)
            | Self::BadRequest(message)
            | Self::Conflict(message) => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
