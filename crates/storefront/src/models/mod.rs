//! Domain models for the storefront.
//!
//! These types represent validated domain objects, separate from the
//! database row types in [`crate::db`].

pub mod cart;
pub mod catalog;
pub mod order;
pub mod review;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine, CartOwner};
pub use catalog::{Category, Product};
pub use order::{Order, OrderLine};
pub use review::Review;
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::User;
