//! Auth route handlers.
//!
//! Sign-in happens at the upstream identity provider; the storefront only
//! needs to forget the user locally on logout.

use axum::http::StatusCode;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::clear_sentry_user;
use crate::middleware::clear_current_user;

/// Log out: drop the current user and start a fresh guest session.
///
/// Flushing also resets the identity gate, so the next sign-in reconciles
/// again.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> StatusCode {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear current user: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();
    StatusCode::NO_CONTENT
}
