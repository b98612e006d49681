//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept exact through every computation. Rounding to the
//! currency's minor unit happens only when a price is displayed or charged,
//! via [`Price::rounded`].

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dirhams, not fils).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Round half-up to the currency's smallest unit.
    ///
    /// Midpoints round away from zero, so `0.125` becomes `0.13` in a
    /// two-decimal currency. The result always carries exactly the minor unit
    /// count as its scale, so `5` becomes `5.00`.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let places = self.currency_code.minor_units();
        let mut amount = self
            .amount
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(places);
        Self::new(amount, self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency_code, self.rounded().amount)
    }
}

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct CurrencyCodeError(pub String);

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    AED,
    USD,
    EUR,
    GBP,
    KWD,
}

impl CurrencyCode {
    /// Number of decimal places in the currency's smallest unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::AED | Self::USD | Self::EUR | Self::GBP => 2,
            Self::KWD => 3,
        }
    }

    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AED => "AED",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::KWD => "KWD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AED" => Ok(Self::AED),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "KWD" => Ok(Self::KWD),
            _ => Err(CurrencyCodeError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_half_up() {
        let price = Price::new(Decimal::new(125, 3), CurrencyCode::AED);
        assert_eq!(price.rounded().amount, Decimal::new(13, 2));

        let price = Price::new(Decimal::new(124, 3), CurrencyCode::AED);
        assert_eq!(price.rounded().amount, Decimal::new(12, 2));

        // Banker's rounding would give 0.12 here.
        let price = Price::new(Decimal::new(115, 3), CurrencyCode::USD);
        assert_eq!(price.rounded().amount, Decimal::new(12, 2));
    }

    #[test]
    fn test_rounded_three_minor_units() {
        let price = Price::new(Decimal::new(12_345, 4), CurrencyCode::KWD);
        assert_eq!(price.rounded().amount, Decimal::new(1235, 3));
    }

    #[test]
    fn test_display_pads_minor_units() {
        assert_eq!(
            Price::new(Decimal::new(5, 0), CurrencyCode::AED).to_string(),
            "AED 5.00"
        );
        assert_eq!(
            Price::new(Decimal::new(6497, 2), CurrencyCode::USD).to_string(),
            "USD 64.97"
        );
        assert_eq!(Price::zero(CurrencyCode::KWD).to_string(), "KWD 0.000");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("aed".parse::<CurrencyCode>().unwrap(), CurrencyCode::AED);
        assert_eq!("GBP".parse::<CurrencyCode>().unwrap(), CurrencyCode::GBP);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_serde_amount_as_string() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::AED);
        let json = serde_json::to_value(price).unwrap();
        assert_eq!(json["amount"], "19.99");
        assert_eq!(json["currency_code"], "AED");
    }
}
