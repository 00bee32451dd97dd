//! Core types for Mars Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod rating;
pub mod status;
pub mod username;

pub use id::*;
pub use price::Price;
pub use rating::Rating;
pub use status::*;
pub use username::{Username, UsernameError};
