//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is empty after trimming.
    #[error("username cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace in the middle.
    #[error("username cannot contain whitespace")]
    ContainsWhitespace,
}

/// A login name.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-150 characters
/// - No inner whitespace
///
/// ## Examples
///
/// ```
/// use mars_shop_core::Username;
///
/// assert_eq!(Username::parse("  marvin ").map(|u| u.into_inner()), Ok("marvin".to_owned()));
/// assert!(Username::parse("   ").is_err());
/// assert!(Username::parse("two words").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 150;

    /// Parse a `Username` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// 150 characters, or contains whitespace.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(UsernameError::ContainsWhitespace);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Username {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Username {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Username {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_usernames() {
        assert!(Username::parse("marvin").is_ok());
        assert!(Username::parse("user_42").is_ok());
        assert!(Username::parse("a").is_ok());
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(Username::parse("  ziggy \n").unwrap().as_str(), "ziggy");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
        assert_eq!(Username::parse("  \t"), Err(UsernameError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(151);
        assert!(matches!(
            Username::parse(&long),
            Err(UsernameError::TooLong { .. })
        ));
        assert!(Username::parse(&"a".repeat(150)).is_ok());
    }

    #[test]
    fn test_parse_inner_whitespace() {
        assert_eq!(
            Username::parse("john smith"),
            Err(UsernameError::ContainsWhitespace)
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let username = Username::parse("marvin").unwrap();
        let json = serde_json::to_string(&username).unwrap();
        assert_eq!(json, "\"marvin\"");
        let parsed: Username = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, username);
    }
}
