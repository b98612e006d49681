//! Customer pricing tiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown [`CustomerTier`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid customer tier: {0}")]
pub struct CustomerTierError(pub String);

/// Customer pricing class.
///
/// The tier price is applied when a line item is built, so it becomes part
/// of the item's price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    /// List price.
    #[default]
    Retail,
    /// Trade accounts buying in bulk (15% off list).
    Wholesale,
    /// Registered repair technicians (10% off list).
    Technician,
}

impl CustomerTier {
    /// Multiplier applied to the list price.
    #[must_use]
    pub fn price_factor(self) -> Decimal {
        match self {
            Self::Retail => Decimal::ONE,
            Self::Wholesale => Decimal::new(85, 2),
            Self::Technician => Decimal::new(90, 2),
        }
    }

    /// Price this tier pays for an item listed at `list_price`.
    #[must_use]
    pub fn price_for(self, list_price: Decimal) -> Decimal {
        list_price * self.price_factor()
    }
}

impl std::fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retail => write!(f, "retail"),
            Self::Wholesale => write!(f, "wholesale"),
            Self::Technician => write!(f, "technician"),
        }
    }
}

impl std::str::FromStr for CustomerTier {
    type Err = CustomerTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retail" => Ok(Self::Retail),
            "wholesale" => Ok(Self::Wholesale),
            "technician" => Ok(Self::Technician),
            _ => Err(CustomerTierError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_for() {
        let list = Decimal::new(10_000, 2);
        assert_eq!(CustomerTier::Retail.price_for(list), list);
        assert_eq!(
            CustomerTier::Wholesale.price_for(list),
            Decimal::new(8500, 2)
        );
        assert_eq!(
            CustomerTier::Technician.price_for(list),
            Decimal::new(9000, 2)
        );
    }

    #[test]
    fn test_roundtrip_str() {
        for tier in [
            CustomerTier::Retail,
            CustomerTier::Wholesale,
            CustomerTier::Technician,
        ] {
            assert_eq!(tier.to_string().parse::<CustomerTier>().unwrap(), tier);
        }
        assert!("vip".parse::<CustomerTier>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&CustomerTier::Wholesale).unwrap();
        assert_eq!(json, "\"wholesale\"");
    }
}
