//! Nexus Core - Shared types and the shopping cart store.
//!
//! This crate provides the types used across all Nexus components:
//! - `storefront` - Public-facing JSON storefront service
//! - `cli` - Command-line tools for migrations and cart inspection
//!
//! # Architecture
//!
//! The core crate contains only types, pure logic and traits - no I/O, no
//! database access, no HTTP clients. Persisting a cart is the caller's job;
//! the store only hands out and accepts [`cart::PersistedCart`] snapshots.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, order IDs, prices and tiers
//! - [`cart`] - The in-memory cart store, pricing rules, snapshots and merging

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use types::*;
