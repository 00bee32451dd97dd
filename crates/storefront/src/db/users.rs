//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mars_shop_core::{UserId, Username};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    is_staff: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            is_staff: row.is_staff,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, is_staff, created_at
            FROM shop.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Whether a username is already taken.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &Username) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.user WHERE username = $1)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Create a new user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user (username, password_hash, is_staff)
            VALUES ($1, $2, $3)
            RETURNING id, username, is_staff, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username"))?;

        User::try_from(row)
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, username, is_staff, created_at, password_hash
            FROM shop.user
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password_hash)))
    }

    /// Count registered users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.user")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Grant or revoke staff access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_staff(&self, username: &Username, is_staff: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.user SET is_staff = $1 WHERE username = $2")
            .bind(is_staff)
            .bind(username)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
