//! Integration tests for Mars Shop.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the storefront against a scratch database
//! cargo run -p mars-shop-cli -- migrate
//! cargo run -p mars-shop-storefront
//!
//! # Run the ignored HTTP tests
//! cargo test -p mars-shop-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `MARS_SHOP_TEST_URL` - Storefront base URL (default: `http://localhost:3000`)
//! - `MARS_SHOP_DATABASE_URL` - Same database the server uses, for fixtures
//!
//! Every test client sends its own random `X-Forwarded-For` address so the
//! login rate limiter treats test clients as separate visitors.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::Ipv4Addr;

use reqwest::{Client, StatusCode, header, redirect};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use mars_shop_core::{Price, Username};
use mars_shop_storefront::db::{self, CategoryRepository, ProductRepository, UserRepository};

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "red-planet-42";

/// Storefront base URL.
#[must_use]
pub fn base_url() -> String {
    std::env::var("MARS_SHOP_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Absolute URL for a path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A browser-like client: cookie jar, no redirect following, own client IP.
#[must_use]
pub fn client() -> Client {
    let ip = Ipv4Addr::new(10, rand::random(), rand::random(), rand::random::<u8>().max(1));

    let mut headers = header::HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        header::HeaderValue::from_str(&ip.to_string()).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Unique username for one test run.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..12])
}

/// Connect to the test database.
pub async fn pool() -> PgPool {
    let url = std::env::var("MARS_SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("MARS_SHOP_DATABASE_URL must be set for integration tests");
    db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// Insert a product in a throwaway category and return its id.
pub async fn seed_product(pool: &PgPool, price: &str) -> i32 {
    let category = CategoryRepository::new(pool)
        .get_or_create(&unique_username("category"))
        .await
        .expect("Failed to create category");

    let price: Decimal = price.parse().expect("valid price");
    ProductRepository::new(pool)
        .create(
            category.id,
            &unique_username("product"),
            "Integration test product",
            Price::new(price),
            None,
        )
        .await
        .expect("Failed to create product")
        .as_i32()
}

/// Grant dashboard access to a registered user.
pub async fn make_staff(pool: &PgPool, username: &str) {
    set_staff(pool, username, true).await;
}

/// Take dashboard access away again.
pub async fn revoke_staff(pool: &PgPool, username: &str) {
    set_staff(pool, username, false).await;
}

async fn set_staff(pool: &PgPool, username: &str, is_staff: bool) {
    let username = Username::parse(username).expect("valid username");
    UserRepository::new(pool)
        .set_staff(&username, is_staff)
        .await
        .expect("Failed to change staff access");
}

/// Register through the form; the client ends up logged in.
pub async fn register(client: &Client, username: &str) {
    let resp = client
        .post(url("/register"))
        .form(&[
            ("username", username),
            ("password1", TEST_PASSWORD),
            ("password2", TEST_PASSWORD),
        ])
        .send()
        .await
        .expect("register request failed");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "registration should redirect");
    assert_eq!(location(&resp), "/");
}

/// Log in through the form.
pub async fn login(client: &Client, username: &str) -> reqwest::Response {
    client
        .post(url("/login"))
        .form(&[("username", username), ("password", TEST_PASSWORD)])
        .send()
        .await
        .expect("login request failed")
}

/// Log out through the form.
pub async fn logout(client: &Client) {
    let resp = client
        .post(url("/logout"))
        .send()
        .await
        .expect("logout request failed");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

/// `Location` header of a redirect, or empty.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// POST a JSON body and return status plus parsed response.
pub async fn post_json(client: &Client, path: &str, body: &Value) -> (StatusCode, Value) {
    let resp = client
        .post(url(path))
        .json(body)
        .send()
        .await
        .expect("API request failed");
    let status = resp.status();
    let json = resp.json().await.expect("API response is JSON");
    (status, json)
}

/// GET a JSON endpoint.
pub async fn get_json(client: &Client, path: &str) -> (StatusCode, Value) {
    let resp = client
        .get(url(path))
        .send()
        .await
        .expect("API request failed");
    let status = resp.status();
    let json = resp.json().await.unwrap_or(Value::Null);
    (status, json)
}

/// GET a page and return status plus body text.
pub async fn get_page(client: &Client, path: &str) -> (StatusCode, String) {
    let resp = client
        .get(url(path))
        .send()
        .await
        .expect("page request failed");
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    (status, body)
}

/// Add a product to the cart and place an order; returns the order id.
pub async fn buy(client: &Client, product_id: i32, qty: i64) -> i64 {
    let (status, _) = post_json(
        client,
        "/api/cart/add",
        &serde_json::json!({"product_id": product_id, "qty": qty}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(client, "/api/orders/create", &serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {body}");
    body["order_id"].as_i64().expect("order id")
}
