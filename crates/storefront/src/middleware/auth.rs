//! Authentication middleware and extractors.
//!
//! Authentication itself happens upstream: the identity provider in front of
//! the storefront forwards the signed-in user's ID in a trusted header. The
//! identity layer mirrors that header into the session so handlers and the
//! reconciliation layer see one consistent current user.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderName, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::Span;

use threadline_core::UserId;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection returned when a signed-in user is required.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "Sign in required").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject guests.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Read the current user from the session, treating read errors as signed out.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// User ID carried in the trusted identity header, if any.
///
/// Blank or non-UTF-8 values count as absent.
#[must_use]
pub fn user_from_headers(headers: &HeaderMap, header: &HeaderName) -> Option<UserId> {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(UserId::new)
}

/// Middleware that mirrors the upstream identity into the session.
///
/// The state is the name of the trusted identity header. Present header: the
/// session's current user is set (or replaced). Absent header: any current
/// user is cleared.
pub async fn identity_middleware(
    State(auth_header): State<HeaderName>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let upstream = user_from_headers(request.headers(), &auth_header);
    let stored = current_user(&session).await;

    match (upstream, stored) {
        (Some(id), stored) => {
            Span::current().record("user_id", id.as_str());
            set_sentry_user(&id);
            if stored.as_ref().map(|u| &u.id) != Some(&id) {
                let user = CurrentUser { id };
                if let Err(e) = set_current_user(&session, &user).await {
                    tracing::error!(error = %e, "Failed to store current user in session");
                }
            }
        }
        (None, Some(_)) => {
            clear_sentry_user();
            if let Err(e) = clear_current_user(&session).await {
                tracing::error!(error = %e, "Failed to clear current user from session");
            }
        }
        (None, None) => {}
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn header() -> HeaderName {
        HeaderName::from_static("x-authenticated-user")
    }

    #[test]
    fn test_user_from_headers_present() {
        let mut headers = HeaderMap::new();
        headers.insert(header(), HeaderValue::from_static(" user-42 "));
        assert_eq!(
            user_from_headers(&headers, &header()),
            Some(UserId::new("user-42"))
        );
    }

    #[test]
    fn test_user_from_headers_absent_or_blank() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_from_headers(&headers, &header()), None);

        headers.insert(header(), HeaderValue::from_static("   "));
        assert_eq!(user_from_headers(&headers, &header()), None);
    }

    #[test]
    fn test_rejection_is_unauthorized() {
        assert_eq!(
            AuthRejection.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
