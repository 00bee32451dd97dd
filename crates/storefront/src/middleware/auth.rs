//! Authentication middleware and extractors.
//!
//! Provides extractors for the current user and for staff-only handlers,
//! plus login and logout helpers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a staff user.
///
/// The staff flag is read from the database on every request, so revoking
/// it takes effect immediately. Anonymous HTML requests are redirected to
/// the login page and API requests get `401 Unauthorized`. Authenticated
/// users without the staff flag get `403 Forbidden`.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireStaff(user): RequireStaff) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireStaff(pub CurrentUser);

/// Error returned when a staff user is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Logged in but not allowed.
    Forbidden,
    /// The user lookup itself failed.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

/// Bring the session copy of a user up to date with the stored row.
///
/// Returns `None` when the user no longer exists.
fn refresh(session_copy: CurrentUser, stored: Option<&User>) -> Option<CurrentUser> {
    let stored = stored?;
    if stored.is_staff != session_copy.is_staff {
        tracing::info!(user_id = %stored.id, is_staff = stored.is_staff, "Staff flag changed");
    }
    Some(CurrentUser::from(stored))
}

/// The logged-in user, re-read from the database.
///
/// A session whose user was deleted is treated as anonymous and its user
/// entry is dropped.
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let Some(session_copy) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    let stored = UserRepository::new(state.pool())
        .get_by_id(session_copy.id)
        .await?;
    let user = refresh(session_copy, stored.as_ref());

    if user.is_none() {
        tracing::warn!("Session refers to a deleted user; logging out");
        session
            .remove::<CurrentUser>(session_keys::CURRENT_USER)
            .await?;
    }

    Ok(user)
}

fn missing_user_rejection(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

/// Decide staff access for an already refreshed user.
fn authorize_staff(parts: &Parts, user: Option<CurrentUser>) -> Result<CurrentUser, AuthRejection> {
    let user = user.ok_or_else(|| missing_user_rejection(parts))?;

    if !user.is_staff {
        tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Staff page denied");
        return Err(AuthRejection::Forbidden);
    }

    Ok(user)
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)
            .await
            .map_err(AuthRejection::Failed)?;
        authorize_staff(parts, user).map(Self)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireStaff`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts, state).await?))
    }
}

/// Log a user in: rotate the session id and store the user.
///
/// The guest cart key survives the id rotation so the cart can be merged
/// afterwards.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<CurrentUser, tower_sessions::session::Error> {
    let current = CurrentUser::from(user);

    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, &current).await?;
    Ok(current)
}

/// Log the user out by discarding the whole session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use chrono::Utc;
    use mars_shop_core::{UserId, Username};

    use super::*;

    fn parts(path: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .uri(path)
            .body(())
            .unwrap_or_default()
            .into_parts();
        parts
    }

    fn stored_user(is_staff: bool) -> User {
        User {
            id: UserId::new(7),
            username: Username::parse("ops").unwrap(),
            is_staff,
            created_at: Utc::now(),
        }
    }

    fn logged_in_as_staff() -> CurrentUser {
        CurrentUser::from(&stored_user(true))
    }

    #[test]
    fn test_api_paths_get_401() {
        assert!(matches!(
            authorize_staff(&parts("/api/stats/sales"), None),
            Err(AuthRejection::Unauthorized)
        ));
    }

    #[test]
    fn test_pages_redirect_to_login() {
        let response = authorize_staff(&parts("/admin-dashboard"), None)
            .err()
            .map(IntoResponse::into_response);
        let response = response.unwrap_or_else(|| StatusCode::OK.into_response());
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some(LOGIN_PATH)
        );
    }

    #[test]
    fn test_staff_passes() {
        let user = refresh(logged_in_as_staff(), Some(&stored_user(true)));
        assert!(authorize_staff(&parts("/api/stats/sales"), user).is_ok());
    }

    #[test]
    fn test_revoked_staff_is_forbidden() {
        // Session still says staff, the database no longer does.
        let user = refresh(logged_in_as_staff(), Some(&stored_user(false)));
        assert_eq!(user.as_ref().map(|u| u.is_staff), Some(false));

        let rejection = authorize_staff(&parts("/api/stats/sales"), user);
        assert!(matches!(rejection, Err(AuthRejection::Forbidden)));
        let status = rejection.err().map(|r| r.into_response().status());
        assert_eq!(status, Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_deleted_user_is_anonymous() {
        assert!(refresh(logged_in_as_staff(), None).is_none());
        assert!(matches!(
            authorize_staff(&parts("/admin-dashboard"), refresh(logged_in_as_staff(), None)),
            Err(AuthRejection::RedirectToLogin)
        ));
    }
}
