//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! carries the signed-in user, the identity gate, and all guest state. The
//! session cookie is signed with a key derived from
//! `STOREFRONT_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "tl_session";

/// Session expiry time in seconds (30 days). Guest bags outlive a week away.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Cookie signing key for `secret`.
///
/// The secret is stretched to the 64 bytes the cookie key needs with SHA-512.
#[must_use]
pub fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer with `PostgreSQL` store.
///
/// The session table is created by `tl-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::{Router, routing::get};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session};

    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_owned())
    }

    async fn visits(session: Session) -> String {
        let seen: usize = session.get("visits").await.unwrap().unwrap_or_default();
        session.insert("visits", seen + 1).await.unwrap();
        seen.to_string()
    }

    fn app(store: MemoryStore, key: Key) -> Router {
        Router::new().route("/", get(visits)).layer(
            SessionManagerLayer::new(store)
                .with_name(SESSION_COOKIE_NAME)
                .with_secure(false)
                .with_signed(key),
        )
    }

    async fn get_with_cookie(app: Router, cookie: Option<&str>) -> (String, Option<String>) {
        let mut request = Request::get("/");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_owned());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (String::from_utf8(body.to_vec()).unwrap(), cookie)
    }

    #[test]
    fn test_signing_key_depends_on_secret() {
        let one = secret("k7Qm2vX9pL4wR8tY1nB6cJ3hF5gD0sZa");
        let other = secret("p3Wn8rT1yU6iO9aS2dF5gH7jK0lZ4xCv");

        assert!(signing_key(&one) == signing_key(&one));
        assert!(signing_key(&one) != signing_key(&other));
    }

    #[tokio::test]
    async fn test_cookie_signed_with_another_secret_is_ignored() {
        let store = MemoryStore::default();
        let ours = app(store.clone(), signing_key(&secret("k7Qm2vX9pL4wR8tY1nB6cJ3hF5gD0sZa")));
        let theirs = app(store, signing_key(&secret("p3Wn8rT1yU6iO9aS2dF5gH7jK0lZ4xCv")));

        let (first, cookie) = get_with_cookie(ours.clone(), None).await;
        let cookie = cookie.unwrap();
        assert_eq!(first, "0");

        let (second, _) = get_with_cookie(ours, Some(&cookie)).await;
        assert_eq!(second, "1");

        let (forged, _) = get_with_cookie(theirs, Some(&cookie)).await;
        assert_eq!(forged, "0");
    }
}
