//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::reviews::ReviewError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Review submission failed.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this is a server-side failure worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err)
            | Self::Auth(AuthError::Repository(err))
            | Self::Checkout(CheckoutError::Repository(err))
            | Self::Review(ReviewError::Repository(err)) => {
                !matches!(
                    err,
                    RepositoryError::NotFound
                        | RepositoryError::Conflict(_)
                        | RepositoryError::OutOfRange(_)
                )
            }
            Self::Session(_) | Self::Internal(_) | Self::Auth(AuthError::PasswordHash) => true,
            _ => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(RepositoryError::OutOfRange(_))
            | Self::Checkout(CheckoutError::Repository(RepositoryError::OutOfRange(_))) => {
                StatusCode::BAD_REQUEST
            }
            Self::Auth(AuthError::InvalidCredentials) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(AuthError::Registration(_))
            | Self::Checkout(CheckoutError::CartEmpty)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Review(ReviewError::NotPurchased) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    ///
    /// Internal error details are never exposed.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Database(RepositoryError::NotFound) => "not found".to_string(),
            Self::Database(RepositoryError::OutOfRange(what))
            | Self::Checkout(CheckoutError::Repository(RepositoryError::OutOfRange(what))) => {
                what.clone()
            }
            Self::Auth(AuthError::InvalidCredentials) => "Invalid username or password.".to_string(),
            Self::Auth(AuthError::Registration(errors)) => errors.join(" "),
            Self::Checkout(err) => err.to_string(),
            Self::Review(ReviewError::NotPurchased) => {
                "You can only review products you have purchased.".to_string()
            }
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }

    /// Report server errors to Sentry and the log.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("x".to_string()))),
            StatusCode::CONFLICT
        );
        let overflow = AppError::Database(RepositoryError::OutOfRange("cart quantity too large".to_string()));
        assert_eq!(overflow.status(), StatusCode::BAD_REQUEST);
        assert!(!overflow.is_server_error());
        assert_eq!(overflow.public_message(), "cart quantity too large");
        let corrupt = AppError::Database(RepositoryError::DataCorruption("bad".to_string()));
        assert!(corrupt.is_server_error());
        assert_eq!(corrupt.public_message(), "Internal server error");
    }

    #[test]
    fn test_domain_errors() {
        let huge_total = AppError::Checkout(CheckoutError::Repository(
            RepositoryError::OutOfRange("order total too large".to_string()),
        ));
        assert_eq!(huge_total.status(), StatusCode::BAD_REQUEST);
        assert_eq!(huge_total.public_message(), "order total too large");

        let empty = AppError::Checkout(CheckoutError::CartEmpty);
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.public_message(), "cart empty");

        let review = AppError::Review(ReviewError::NotPurchased);
        assert_eq!(review.status(), StatusCode::FORBIDDEN);
        assert!(!review.is_server_error());

        let login = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(login.public_message(), "Invalid username or password.");
    }
}
