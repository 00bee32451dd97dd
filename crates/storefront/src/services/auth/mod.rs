//! Authentication service.
//!
//! Username and password accounts hashed with Argon2id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use mars_shop_core::{Username, UsernameError};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 4;

pub const MSG_USERNAME_REQUIRED: &str = "Enter a username.";
pub const MSG_PASSWORDS_REQUIRED: &str = "Enter a password and its confirmation.";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Password must be at least 4 characters.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Authentication service.
///
/// Handles user registration and login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// All rules are checked before anything is written so the form can show
    /// every problem at once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Registration` with every failing rule.
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn register(
        &self,
        username: &str,
        password1: &str,
        password2: &str,
    ) -> Result<User, AuthError> {
        let (username, mut errors) = validate_registration(username, password1, password2);

        if let Some(ref username) = username
            && self.users.username_exists(username).await?
        {
            errors.push(MSG_USERNAME_TAKEN.to_owned());
        }

        let Some(username) = username.filter(|_| errors.is_empty()) else {
            return Err(AuthError::Registration(errors));
        };

        let password_hash = hash_password(password1)?;

        // A concurrent registration can still win the race for the name.
        let user = self
            .users
            .create(&username, &password_hash, false)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AuthError::Registration(vec![MSG_USERNAME_TAKEN.to_owned()])
                }
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Check registration input without touching the database.
///
/// Returns the parsed username when it is valid, plus every failing rule.
#[must_use]
pub fn validate_registration(
    username: &str,
    password1: &str,
    password2: &str,
) -> (Option<Username>, Vec<String>) {
    let mut errors = Vec::new();

    let username = match Username::parse(username) {
        Ok(username) => Some(username),
        Err(UsernameError::Empty) => {
            errors.push(MSG_USERNAME_REQUIRED.to_owned());
            None
        }
        Err(UsernameError::TooLong { max }) => {
            errors.push(format!("Username must be at most {max} characters."));
            None
        }
        Err(UsernameError::ContainsWhitespace) => {
            errors.push("Username cannot contain spaces.".to_owned());
            None
        }
    };

    if password1.is_empty() || password2.is_empty() {
        errors.push(MSG_PASSWORDS_REQUIRED.to_owned());
    }

    if password1 != password2 {
        errors.push(MSG_PASSWORD_MISMATCH.to_owned());
    }

    if password1.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(MSG_PASSWORD_TOO_SHORT.to_owned());
    }

    (username, errors)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_registration() {
        let (username, errors) = validate_registration(" marvin ", "mars", "mars");
        assert_eq!(username.unwrap().as_str(), "marvin");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_registration_collects_every_error() {
        let (username, errors) = validate_registration("", "abc", "xyz");
        assert!(username.is_none());
        assert_eq!(
            errors,
            vec![
                MSG_USERNAME_REQUIRED.to_owned(),
                MSG_PASSWORD_MISMATCH.to_owned(),
                MSG_PASSWORD_TOO_SHORT.to_owned(),
            ]
        );
    }

    #[test]
    fn test_registration_missing_confirmation() {
        let (_, errors) = validate_registration("bob", "abcd", "");
        assert_eq!(
            errors,
            vec![
                MSG_PASSWORDS_REQUIRED.to_owned(),
                MSG_PASSWORD_MISMATCH.to_owned(),
            ]
        );
    }

    #[test]
    fn test_registration_all_fields_empty() {
        let (username, errors) = validate_registration("", "", "");
        assert!(username.is_none());
        assert_eq!(
            errors,
            vec![
                MSG_USERNAME_REQUIRED.to_owned(),
                MSG_PASSWORDS_REQUIRED.to_owned(),
                MSG_PASSWORD_TOO_SHORT.to_owned(),
            ]
        );
    }

    #[test]
    fn test_registration_short_password() {
        let (_, errors) = validate_registration("marvin", "abc", "abc");
        assert_eq!(errors, vec![MSG_PASSWORD_TOO_SHORT.to_owned()]);

        let (_, errors) = validate_registration("marvin", "abcd", "abcd");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_registration_bad_username_shape() {
        let (username, errors) = validate_registration("two words", "abcd", "abcd");
        assert!(username.is_none());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("red planet").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("red planet", &hash).is_ok());
        assert!(matches!(
            verify_password("blue planet", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert!(matches!(
            verify_password("x", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
