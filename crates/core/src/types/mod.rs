//! Core types for Nexus.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod tier;

pub use id::{OrderId, ProductId, ProductIdError};
pub use price::{CurrencyCode, CurrencyCodeError, Price};
pub use tier::{CustomerTier, CustomerTierError};
