//! Mars Shop Core - Shared domain types.
//!
//! This crate provides the types used by every Mars Shop component:
//! - `storefront` - Catalog, cart, checkout, reviews and the stats dashboard
//! - `cli` - Migrations, user and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, usernames, ratings and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
