//! Session-related types.
//!
//! Types stored in the session for authentication state, the guest cart and
//! one-shot flash messages.

use serde::{Deserialize, Serialize};

use mars_shop_core::{UserId, Username};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: Username,
    /// Staff users may open the sales dashboard.
    pub is_staff: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
        }
    }
}

/// Severity of a flash message, used as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart key.
    pub const CART_KEY: &str = "cart_key";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";

    /// Key for ids of orders placed as a guest in this session.
    pub const GUEST_ORDERS: &str = "guest_orders";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_level_serializes_lowercase() {
        let json = serde_json::to_string(&FlashMessage::error("nope")).unwrap();
        assert_eq!(json, r#"{"level":"error","text":"nope"}"#);
    }

    #[test]
    fn test_current_user_roundtrip() {
        let user = CurrentUser {
            id: UserId::new(3),
            username: Username::parse("ziggy").unwrap(),
            is_staff: true,
        };
        let value = serde_json::to_value(&user).unwrap();
        let back: CurrentUser = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.username, user.username);
        assert!(back.is_staff);
    }
}
