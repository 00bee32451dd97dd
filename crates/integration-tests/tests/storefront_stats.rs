//! Staff dashboard and stats API against a running storefront.
//!
//! Run with: cargo test -p mars-shop-integration-tests -- --ignored

use reqwest::StatusCode;

use mars_shop_integration_tests::{
    buy, client, get_json, get_page, location, make_staff, pool, register, revoke_staff,
    seed_product, unique_username, url,
};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_dashboard_requires_staff() {
    let anonymous = client();
    let resp = anonymous.get(url("/admin-dashboard")).send().await.unwrap();
    assert_eq!(location(&resp), "/login");

    let (status, _) = get_json(&anonymous, "/api/stats/sales").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = client();
    register(&customer, &unique_username("customer")).await;
    let (status, _) = get_page(&customer, "/admin-dashboard").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get_json(&customer, "/api/stats/categories").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_staff_sees_sales() {
    let pool = pool().await;
    let product = seed_product(&pool, "100.00").await;

    let username = unique_username("staff");
    let client = client();
    register(&client, &username).await;
    buy(&client, product, 1).await;

    // Granted while logged in; no need to log in again
    make_staff(&pool, &username).await;

    let (status, body) = get_page(&client, "/admin-dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Completed orders"));

    let (status, sales) = get_json(&client, "/api/stats/sales?days=7").await;
    assert_eq!(status, StatusCode::OK);
    let labels = sales["labels"].as_array().unwrap();
    let values = sales["values"].as_array().unwrap();
    assert_eq!(labels.len(), values.len());
    assert!(values.iter().any(|v| v.as_f64().unwrap() >= 100.0));

    let (status, categories) = get_json(&client, "/api/stats/categories?days=junk").await;
    assert_eq!(status, StatusCode::OK);
    assert!(categories["labels"].as_array().is_some());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_revoked_staff_loses_access_immediately() {
    let pool = pool().await;
    let username = unique_username("exstaff");
    let client = client();
    register(&client, &username).await;
    make_staff(&pool, &username).await;

    let (status, _) = get_json(&client, "/api/stats/sales").await;
    assert_eq!(status, StatusCode::OK);

    revoke_staff(&pool, &username).await;

    let (status, _) = get_json(&client, "/api/stats/sales").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get_page(&client, "/admin-dashboard").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
