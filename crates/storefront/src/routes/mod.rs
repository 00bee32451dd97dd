//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Catalog (anonymous → /welcome)
//! GET  /welcome                   - Landing page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database ping)
//!
//! # Auth
//! GET  /login                     - Login page
//! POST /login                     - Login action (rate limited)
//! GET  /register                  - Register page
//! POST /register                  - Register action (rate limited)
//! GET  /logout                    - Logout action
//! POST /logout                    - Logout action
//!
//! # Shop
//! GET  /product/{id}              - Product detail with reviews
//! GET  /product/{id}/review       - Review form
//! POST /product/{id}/review       - Submit review
//! GET  /cart                      - Cart page
//! GET  /order/success/{id}        - Order confirmation
//! GET  /order/{id}/reviews        - Review status of an order
//!
//! # Staff
//! GET  /admin-dashboard           - Sales dashboard
//!
//! # JSON API (rate limited)
//! GET  /api/products              - Product list
//! GET  /api/cart                  - Cart contents
//! POST /api/cart/add              - Add product
//! POST /api/cart/update_qty       - Increase / decrease a line
//! POST /api/cart/clear            - Empty the cart
//! POST /api/orders/create         - Checkout
//! GET  /api/stats/sales           - Revenue per day (staff)
//! GET  /api/stats/categories      - Revenue per category (staff)
//! ```
//!
//! Trailing slashes are trimmed before routing, see [`service`].

pub mod api;
pub mod auth;
pub mod cart;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod pages;
pub mod params;
pub mod products;
pub mod reviews;
pub mod views;

use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, csp_nonce_middleware,
    request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Login and registration form posts, behind the strict limiter.
fn auth_form_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/welcome", get(pages::welcome))
        // Auth
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", get(auth::logout).post(auth::logout))
        .merge(auth_form_routes())
        // Shop
        .route("/product/{id}", get(products::show))
        .route(
            "/product/{id}/review",
            get(reviews::add_review_page).post(reviews::add_review),
        )
        .route("/cart", get(cart::show))
        .route("/order/success/{id}", get(orders::success))
        .route("/order/{id}/reviews", get(reviews::order_reviews))
        // Staff
        .route("/admin-dashboard", get(dashboard::show))
        // JSON API
        .merge(api::router().route_layer(api_rate_limiter()))
}

/// Build the application router with every middleware layer.
///
/// Layer order matches [`crate::middleware`]: Sentry outermost, sessions
/// innermost.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let static_dir = state.config().static_dir.clone();
    let media_dir = state.config().media_dir.clone();

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(session_layer)
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// The application wrapped so `/cart/` and `/cart` route the same.
///
/// Path normalization has to run before routing, so it wraps the router
/// instead of being added with `Router::layer`.
pub fn service(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app(state))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{SentryConfig, StorefrontConfig};

    /// State whose pool never connects; only routes that skip the database
    /// can be exercised.
    fn offline_state() -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://shop@localhost/shop_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            static_dir: PathBuf::from("static"),
            media_dir: PathBuf::from("media"),
            sentry: SentryConfig::default(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://shop@localhost/shop_test")
            .unwrap();
        AppState::new(config, pool)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let response = app(offline_state())
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let response = service(offline_state())
            .oneshot(get_request("/health/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let response = app(offline_state())
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert!(headers.contains_key("x-request-id"));

        let csp = headers
            .get(header::CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(csp.contains("'nonce-"));
    }

    #[tokio::test]
    async fn test_anonymous_catalog_redirects_to_welcome() {
        let response = app(offline_state()).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/welcome");
    }

    #[tokio::test]
    async fn test_stats_api_requires_login() {
        let response = app(offline_state())
            .oneshot(get_request("/api/stats/sales?days=7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dashboard_redirects_anonymous_to_login() {
        let response = app(offline_state())
            .oneshot(get_request("/admin-dashboard"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_non_numeric_ids_are_not_found() {
        for path in [
            "/product/abc",
            "/product/1x/review",
            "/order/success/-3",
            "/order/99999999999/reviews",
        ] {
            let response = app(offline_state()).oneshot(get_request(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}
