//! Catalog validation.
//!
//! # Usage
//!
//! ```bash
//! nexus-cli catalog check crates/storefront/catalog.json
//! ```

use std::path::Path;

use nexus_storefront::catalog::{Catalog, CatalogError};

/// Load the catalog at `path` and log what it contains.
///
/// # Errors
///
/// Returns `CatalogError` if the catalog cannot be read or is invalid.
pub fn check(path: &Path) -> Result<(), CatalogError> {
    let catalog = Catalog::load(path)?;

    let out_of_stock = catalog
        .products()
        .into_iter()
        .filter(|product| !product.in_stock)
        .count();

    tracing::info!(
        products = catalog.len(),
        out_of_stock,
        discounts = catalog.discount_count(),
        "Catalog OK: {}",
        path.display()
    );
    Ok(())
}
