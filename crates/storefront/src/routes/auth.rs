//! Registration, login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::session::guest_cart_key;
use crate::middleware::{
    CspNonce, OptionalAuth, PageContext, clear_current_user, push_flash, set_current_user,
};
use crate::models::FlashMessage;
use crate::services::auth::{AuthError, AuthService};
use crate::services::cart::merge_guest_cart;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub errors: Vec<String>,
    pub username: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub errors: Vec<String>,
    pub username: String,
}

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        ctx: PageContext::build(&state, Some(&session), None, nonce).await,
        errors: Vec::new(),
        username: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the session id is rotated and the guest cart is merged into
/// the user's cart.
#[instrument(skip(state, session, nonce, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let user = match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            return Ok(LoginTemplate {
                ctx: PageContext::build(&state, Some(&session), None, nonce).await,
                errors: vec!["Invalid username or password.".to_string()],
                username: form.username.trim().to_owned(),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let guest_key = guest_cart_key(&session).await?;
    set_current_user(&session, &user).await?;

    if let Some(key) = guest_key {
        merge_guest_cart(state.pool(), &key, user.id).await?;
    }

    set_sentry_user(&user.id, Some(user.username.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");
    push_flash(&session, FlashMessage::success("You have logged in successfully!")).await;

    Ok(Redirect::to("/").into_response())
}

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        ctx: PageContext::build(&state, Some(&session), None, nonce).await,
        errors: Vec::new(),
        username: String::new(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Every failing rule is shown at once; on success the new user is logged in.
#[instrument(skip(state, session, nonce, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let user = match AuthService::new(state.pool())
        .register(&form.username, &form.password1, &form.password2)
        .await
    {
        Ok(user) => user,
        Err(AuthError::Registration(errors)) => {
            return Ok(RegisterTemplate {
                ctx: PageContext::build(&state, Some(&session), None, nonce).await,
                errors,
                username: form.username.trim().to_owned(),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let guest_key = guest_cart_key(&session).await?;
    set_current_user(&session, &user).await?;

    if let Some(key) = guest_key {
        merge_guest_cart(state.pool(), &key, user.id).await?;
    }

    set_sentry_user(&user.id, Some(user.username.as_str()));
    push_flash(&session, FlashMessage::success("Registration successful!")).await;

    Ok(Redirect::to("/").into_response())
}

/// Log out, then show the welcome page with a notice.
pub async fn logout(session: Session) -> Result<Response, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, FlashMessage::info("You have logged out.")).await;

    Ok(Redirect::to("/welcome").into_response())
}
