//! Mars Shop storefront library.
//!
//! Catalog, cart, checkout, reviews and the staff sales dashboard, served as
//! HTML pages plus a small JSON API. The binary in `main.rs` only loads
//! configuration and serves [`routes::service`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
