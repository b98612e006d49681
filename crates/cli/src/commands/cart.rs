//! Persisted cart inspection.
//!
//! # Usage
//!
//! ```bash
//! # Print the lines and totals of an exported cart
//! nexus-cli cart inspect cart.json
//!
//! # Price it with a different tax rate
//! nexus-cli cart inspect cart.json --tax-rate 0.15
//! ```

use std::fmt::Write as _;
use std::path::Path;

use nexus_core::Price;
use nexus_core::cart::{CartStore, PersistedCart, PricingRules, SnapshotError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while inspecting a cart.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Restore a cart from `path` and print it.
///
/// # Errors
///
/// Returns `InspectError` if the file cannot be read or does not hold a valid cart.
pub fn inspect(path: &Path, tax_rate: Option<Decimal>) -> Result<(), InspectError> {
    let json = std::fs::read_to_string(path).map_err(|source| InspectError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cart = CartStore::restore(PersistedCart::from_json(&json)?)?;

    let mut rules = PricingRules::default();
    if let Some(tax_rate) = tax_rate {
        rules.tax_rate = tax_rate;
    }

    #[allow(clippy::print_stdout)]
    {
        print!("{}", render(&cart, &rules));
    }
    Ok(())
}

/// Format a cart as a plain-text table.
fn render(cart: &CartStore, rules: &PricingRules) -> String {
    let money = |amount: Decimal| Price::new(amount, rules.currency).to_string();
    let mut out = String::new();

    let _ = writeln!(out, "revision {}", cart.revision());
    for line in cart.lines() {
        let _ = writeln!(
            out,
            "{:>4} x {:<32} {:>14} {:>14}",
            line.quantity,
            line.name,
            money(line.unit_price),
            money(line.line_total()),
        );
    }

    let summary = rules.summarize(cart.state());
    let _ = writeln!(out, "items     {}", summary.item_count);
    let _ = writeln!(out, "subtotal  {}", money(summary.subtotal));
    if let Some(discount) = cart.state().discount() {
        let _ = writeln!(out, "discount  -{} ({})", money(summary.discount), discount.code);
    }
    let _ = writeln!(out, "shipping  {}", money(summary.shipping));
    let _ = writeln!(out, "tax       {}", money(summary.tax));
    let _ = writeln!(out, "total     {}", money(summary.total));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexus_core::cart::NewLineItem;

    use super::*;

    #[test]
    fn test_render_totals() {
        let mut cart = CartStore::new();
        cart.add_quantity(NewLineItem::new("p1", "Case", Decimal::new(999, 2)), 2)
            .unwrap();
        cart.add_to_cart(NewLineItem::new("p2", "Cable", Decimal::new(499, 2)))
            .unwrap();

        let text = render(&cart, &PricingRules::default());
        assert!(text.starts_with("revision 2\n"));
        assert!(text.contains("items     3\n"));
        assert!(text.contains("subtotal  AED 24.97\n"));
        assert!(text.contains("shipping  AED 25.00\n"));
        assert!(text.contains("total     AED 51.22\n"));
        assert!(!text.contains("discount"));
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = inspect(Path::new("/nonexistent/cart.json"), None).unwrap_err();
        assert!(matches!(err, InspectError::Io { .. }));
    }
}
