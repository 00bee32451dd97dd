//! Per-request data every full page needs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::auth::OptionalAuth;
use super::csp::CspNonce;
use super::flash::take_flash;
use super::session::cart_owner;
use crate::error::AppError;
use crate::models::{CurrentUser, FlashMessage};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Layout data: current user, cart badge, flash messages and CSP nonce.
///
/// Extracting it consumes the pending flash messages.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: i64,
    pub messages: Vec<FlashMessage>,
    pub nonce: String,
}

impl PageContext {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_staff)
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.username.as_str())
    }
}

impl PageContext {
    /// Assemble the context from already-extracted parts.
    ///
    /// Handlers that may redirect call this after deciding to render, so
    /// pending flash messages survive the redirect.
    pub async fn build(
        state: &AppState,
        session: Option<&Session>,
        user: Option<CurrentUser>,
        nonce: String,
    ) -> Self {
        let Some(session) = session else {
            return Self {
                user,
                nonce,
                ..Self::default()
            };
        };

        let cart_count = match cart_owner(session, user.as_ref(), false).await {
            Ok(Some(owner)) => CartService::new(state.pool(), owner)
                .item_count()
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to count cart items");
                    0
                }),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cart key");
                0
            }
        };

        Self {
            messages: take_flash(session).await,
            user,
            cart_count,
            nonce,
        }
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(CspNonce(nonce)) = CspNonce::from_request_parts(parts, state).await;
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let session = parts.extensions.get::<Session>().cloned();

        Ok(Self::build(state, session.as_ref(), user, nonce).await)
    }
}
