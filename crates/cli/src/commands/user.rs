//! User management commands.

use mars_shop_core::Username;
use mars_shop_storefront::db::{RepositoryError, UserRepository};
use mars_shop_storefront::services::auth::{MIN_PASSWORD_LENGTH, hash_password};

use super::{CliError, connect};

/// Validate input before connecting.
fn validate(username: &str, password: &str) -> Result<Username, CliError> {
    let username = Username::parse(username).map_err(|e| CliError::Invalid(e.to_string()))?;

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CliError::Invalid(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(username)
}

/// Create a user, optionally with dashboard access.
pub async fn create(username: &str, password: &str, staff: bool) -> Result<(), CliError> {
    let username = validate(username, password)?;
    let hash = hash_password(password).map_err(|e| CliError::Invalid(e.to_string()))?;

    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .create(&username, &hash, staff)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                CliError::Invalid(format!("user '{username}' already exists"))
            }
            other => other.into(),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Staff: {}",
        user.id,
        user.username,
        user.is_staff
    );
    Ok(())
}

/// Grant or revoke dashboard access.
pub async fn set_staff(username: &str, is_staff: bool) -> Result<(), CliError> {
    let username = Username::parse(username).map_err(|e| CliError::Invalid(e.to_string()))?;
    let pool = connect().await?;

    UserRepository::new(&pool)
        .set_staff(&username, is_staff)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::Invalid(format!("no user named '{username}'")),
            other => other.into(),
        })?;

    tracing::info!("Staff access for {username}: {is_staff}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_good_input() {
        assert!(validate("  ops ", "hunter2").is_ok());
    }

    #[test]
    fn test_validate_rejects_short_password() {
        assert!(matches!(validate("ops", "abc"), Err(CliError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_username() {
        assert!(matches!(validate("two words", "hunter2"), Err(CliError::Invalid(_))));
        assert!(matches!(validate("", "hunter2"), Err(CliError::Invalid(_))));
    }
}
