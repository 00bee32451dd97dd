//! Request ID middleware for request tracing and correlation.
//!
//! Reuses an upstream `x-request-id` when it looks sane, otherwise generates
//! a UUID v4. The ID is recorded on the tracing span, tagged in Sentry and
//! echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID accepted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Accept an upstream ID only if it is short, printable ASCII.
fn sanitize_upstream_id(value: &str) -> Option<&str> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
    valid.then_some(value)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(sanitize_upstream_id)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_upstream_id() {
        assert_eq!(sanitize_upstream_id("abc-123"), Some("abc-123"));
        assert_eq!(sanitize_upstream_id(" 8f2a:1 "), Some("8f2a:1"));
        assert_eq!(sanitize_upstream_id(""), None);
        assert_eq!(sanitize_upstream_id("has space"), None);
        assert_eq!(sanitize_upstream_id("<script>"), None);
        assert_eq!(sanitize_upstream_id(&"a".repeat(129)), None);
    }
}
