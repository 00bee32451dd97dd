//! Path parameter extractors.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::AppError;

/// A numeric id from the last path segment.
///
/// Anything other than plain digits fitting an `i32` is a missing page,
/// not a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i32);

fn parse_id(raw: &str) -> Option<i32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound(parts.uri.path().to_owned()))?;

        parse_id(&raw)
            .map(Self)
            .ok_or_else(|| AppError::NotFound(parts.uri.path().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("007"), Some(7));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("+1"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("99999999999"), None);
    }

    async fn status_of(uri: &str) -> StatusCode {
        let app = Router::new().route(
            "/product/{id}",
            get(|PathId(id): PathId| async move { id.to_string() }),
        );
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap_or_default())
            .await
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, |r| r.status())
    }

    #[tokio::test]
    async fn test_bad_ids_are_not_found() {
        assert_eq!(status_of("/product/12").await, StatusCode::OK);
        assert_eq!(status_of("/product/abc").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("/product/4294967296").await, StatusCode::NOT_FOUND);
    }
}
