//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: Strict limits for login and registration (~10/min)
//! - `api_rate_limiter`: Relaxed limits for the JSON API (~100/min)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers checked for the real client IP, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor that prefers proxy headers and falls back to the peer address.
///
/// Requests with neither (e.g. in-process tests) share the unspecified
/// address bucket instead of failing.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

/// Client IP from proxy headers, if any is present and valid.
fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    for name in CLIENT_IP_HEADERS {
        if let Some(ip) = headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Some(ip);
        }
    }

    // First hop of X-Forwarded-For
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = ip_from_headers(req.headers()) {
            return Ok(ip);
        }

        Ok(req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
                addr.ip()
            }))
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for the JSON API: ~100 requests per minute per IP.
///
/// Configuration: 1 request per second (replenish), burst of 50.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(1)` and `burst_size(50)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let map = headers(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(ip_from_headers(&map), "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let map = headers(&[("x-forwarded-for", " 198.51.100.4 , 10.0.0.2")]);
        assert_eq!(ip_from_headers(&map), "198.51.100.4".parse().ok());
    }

    #[test]
    fn test_invalid_headers_ignored() {
        let map = headers(&[("x-real-ip", "not-an-ip")]);
        assert_eq!(ip_from_headers(&map), None);
    }

    #[test]
    fn test_falls_back_to_peer_then_unspecified() {
        let mut req = Request::new(());
        let key = ClientIpKeyExtractor.extract(&req).ok();
        assert_eq!(key, Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)));

        let peer: SocketAddr = ([192, 0, 2, 9], 4000).into();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(ClientIpKeyExtractor.extract(&req).ok(), Some(peer.ip()));
    }
}
