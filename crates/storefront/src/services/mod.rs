//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `cart` - Cart contents, quantity changes, guest cart merging
//! - `catalog` - Catalog query parsing and pagination
//! - `checkout` - Turning a cart into an order
//! - `reviews` - Review eligibility and submission
//! - `stats` - Dashboard statistics

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod reviews;
pub mod stats;
