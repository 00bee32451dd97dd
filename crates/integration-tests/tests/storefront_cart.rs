//! Cart API against a running storefront.
//!
//! Run with: cargo test -p mars-shop-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;

use mars_shop_integration_tests::{
    client, get_json, get_page, login, logout, pool, post_json, register, seed_product,
    unique_username,
};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_guest_cart_add_update_clear() {
    let pool = pool().await;
    let product = seed_product(&pool, "2.50").await;
    let client = client();

    let (status, body) =
        post_json(&client, "/api/cart/add", &json!({"product_id": product, "qty": 3})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["cart_total"], 7.5);

    // Adding again grows the same line
    let (_, body) = post_json(&client, "/api/cart/add", &json!({"product_id": product})).await;
    assert_eq!(body["cart_total"], 10.0);

    let (_, cart) = get_json(&client, "/api/cart").await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 4);
    assert_eq!(items[0]["product"]["price"], "2.50");
    let item_id = items[0]["id"].as_i64().unwrap();

    let (_, body) = post_json(
        &client,
        "/api/cart/update_qty",
        &json!({"item_id": item_id, "action": "decrease"}),
    )
    .await;
    assert_eq!(body["new_qty"], 3);
    assert_eq!(body["item_total"], 7.5);
    assert_eq!(body["cart_total"], 7.5);

    // Unknown actions leave the line untouched
    let (_, body) = post_json(
        &client,
        "/api/cart/update_qty",
        &json!({"item_id": item_id, "action": "explode"}),
    )
    .await;
    assert_eq!(body["new_qty"], 3);

    let (status, body) = post_json(&client, "/api/cart/clear", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, cart) = get_json(&client, "/api/cart").await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["cart_total"], 0.0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_decrease_last_unit_deletes_line() {
    let pool = pool().await;
    let product = seed_product(&pool, "1.00").await;
    let client = client();

    post_json(&client, "/api/cart/add", &json!({"product_id": product})).await;
    let (_, cart) = get_json(&client, "/api/cart").await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &client,
        "/api/cart/update_qty",
        &json!({"item_id": item_id, "action": "decrease"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "deleted": true}));

    let (status, body) = post_json(
        &client,
        "/api/cart/update_qty",
        &json!({"item_id": item_id, "action": "increase"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_add_rejects_bad_input() {
    let pool = pool().await;
    let product = seed_product(&pool, "1.00").await;
    let client = client();

    let (status, body) =
        post_json(&client, "/api/cart/add", &json!({"product_id": product, "qty": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) =
        post_json(&client, "/api/cart/add", &json!({"product_id": i32::MAX})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_quantity_overflow_is_bad_request() {
    let pool = pool().await;
    let product = seed_product(&pool, "1.00").await;
    let client = client();
    let huge = json!({"product_id": product, "qty": i32::MAX});

    let (status, _) = post_json(&client, "/api/cart/add", &huge).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(&client, "/api/cart/add", &huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cannot_touch_another_users_cart_line() {
    let pool = pool().await;
    let product = seed_product(&pool, "5.00").await;

    let owner = client();
    post_json(&owner, "/api/cart/add", &json!({"product_id": product})).await;
    let (_, cart) = get_json(&owner, "/api/cart").await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let intruder = client();
    let (status, _) = post_json(
        &intruder,
        "/api/cart/update_qty",
        &json!({"item_id": item_id, "action": "increase"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, cart) = get_json(&owner, "/api/cart").await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_guest_cart_merges_on_login() {
    let pool = pool().await;
    let shared = seed_product(&pool, "3.00").await;
    let guest_only = seed_product(&pool, "4.00").await;

    let username = unique_username("merge");
    let client = client();
    register(&client, &username).await;
    post_json(&client, "/api/cart/add", &json!({"product_id": shared, "qty": 2})).await;
    logout(&client).await;

    // Guest cart in a fresh session
    post_json(&client, "/api/cart/add", &json!({"product_id": shared, "qty": 1})).await;
    post_json(&client, "/api/cart/add", &json!({"product_id": guest_only, "qty": 1})).await;

    login(&client, &username).await;

    let (_, cart) = get_json(&client, "/api/cart").await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let quantity_of = |id: i32| {
        items
            .iter()
            .find(|item| item["product"]["id"] == id)
            .map(|item| item["quantity"].as_i64().unwrap())
    };
    assert_eq!(quantity_of(shared), Some(3));
    assert_eq!(quantity_of(guest_only), Some(1));
    assert_eq!(cart["cart_total"], 13.0);

    let (status, body) = get_page(&client, "/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("$13.00"));
}
