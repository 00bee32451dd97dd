//! JSON API used by the shop and dashboard scripts.
//!
//! Every handler returns [`ApiError`] on failure, which renders as
//! `{"success": false, "error": "..."}` with the status of the underlying
//! [`AppError`].

pub mod cart;
pub mod orders;
pub mod products;
pub mod stats;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::services::checkout::CheckoutError;
use crate::state::AppState;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(stats::router())
}

/// Error body for API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub success: bool,
    pub error: String,
}

/// [`AppError`] rendered as JSON.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.report();
        let body = ApiErrorBody {
            success: false,
            error: self.0.public_message(),
        };
        (self.0.status(), Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err.into())
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::BadRequest(rejection.body_text()))
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Plain `{"success": true}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub const OK: Self = Self { success: true };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_cart_empty_renders_as_json_400() {
        let response = ApiError::from(CheckoutError::CartEmpty).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "cart empty");
    }

    #[tokio::test]
    async fn test_not_found_keeps_status() {
        let response = ApiError::from(RepositoryError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not found");
    }

    #[tokio::test]
    async fn test_quantity_overflow_is_json_400() {
        let err = RepositoryError::OutOfRange("cart quantity too large".to_string());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "cart quantity too large");
    }

    #[tokio::test]
    async fn test_database_error_is_generic() {
        let err = RepositoryError::DataCorruption("bad row".to_string());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }
}
