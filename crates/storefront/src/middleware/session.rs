//! Session middleware configuration, guest cart keys and guest orders.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use mars_shop_core::OrderId;

use crate::config::StorefrontConfig;
use crate::models::{CartOwner, CurrentUser, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "mars_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by the shop migrations.
/// Cookies are signed with a key derived from the configured session secret.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_signed(signing_key(config.session_secret.expose_secret()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Stretch the secret to the 64 bytes a cookie [`Key`] needs.
fn signing_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret.as_bytes()))
}

/// The guest cart key of this session, if one was ever created.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn guest_cart_key(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.get::<String>(session_keys::CART_KEY).await
}

/// The guest cart key of this session, creating one on first use.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn ensure_guest_cart_key(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(key) = guest_cart_key(session).await? {
        return Ok(key);
    }

    let key = Uuid::new_v4().simple().to_string();
    session.insert(session_keys::CART_KEY, &key).await?;
    Ok(key)
}

/// Cart owner for the current request.
///
/// Logged-in users own their cart directly. Guests get a cart key stored in
/// the session, created only when `create` is set so read-only pages do not
/// write a session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn cart_owner(
    session: &Session,
    user: Option<&CurrentUser>,
    create: bool,
) -> Result<Option<CartOwner>, tower_sessions::session::Error> {
    if let Some(user) = user {
        return Ok(Some(CartOwner::User(user.id)));
    }

    let key = if create {
        Some(ensure_guest_cart_key(session).await?)
    } else {
        guest_cart_key(session).await?
    };

    Ok(key.map(CartOwner::Guest))
}

/// Orders placed by this session without an account.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn guest_orders(session: &Session) -> Result<Vec<OrderId>, tower_sessions::session::Error> {
    Ok(session
        .get::<Vec<OrderId>>(session_keys::GUEST_ORDERS)
        .await?
        .unwrap_or_default())
}

/// Remember a guest order so its confirmation page stays visible.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn record_guest_order(
    session: &Session,
    order_id: OrderId,
) -> Result<(), tower_sessions::session::Error> {
    let mut orders = guest_orders(session).await?;
    if !orders.contains(&order_id) {
        orders.push(order_id);
    }
    session.insert(session_keys::GUEST_ORDERS, orders).await
}
