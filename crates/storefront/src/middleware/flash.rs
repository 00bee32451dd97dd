//! One-shot flash messages stored in the session.

use tower_sessions::Session;

use crate::models::{FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// Failures are logged and otherwise ignored; a lost flash message never
/// fails the request.
pub async fn push_flash(session: &Session, message: FlashMessage) {
    let mut messages: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    messages.push(message);

    if let Err(e) = session.insert(session_keys::FLASH, messages).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take all queued messages, clearing them from the session.
pub async fn take_flash(session: &Session) -> Vec<FlashMessage> {
    match session.remove::<Vec<FlashMessage>>(session_keys::FLASH).await {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}
