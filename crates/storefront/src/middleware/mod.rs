//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Security headers (reads the nonce from the response)
//! 5. CSP nonce
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Rate limiters are attached to the auth form posts and the JSON API only.

pub mod auth;
pub mod csp;
pub mod flash;
pub mod page_context;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireStaff, clear_current_user, set_current_user};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use flash::{push_flash, take_flash};
pub use page_context::PageContext;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{cart_owner, create_session_layer};
