//! Threadline storefront library.
//!
//! Guest bag and wishlist capture, signed-in drafts and wishlists, and the
//! reconciliation that merges a guest's session into their account when they
//! sign in. Exposed as a library so the CLI and integration tests can reuse
//! the stores and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use db::PgDocumentStore;
use state::AppState;

/// Build the storefront router with its middleware stack.
///
/// Health endpoints sit outside the session stack so probes never touch the
/// session table.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .merge(routes::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.reconcile_state(),
            middleware::reconcile_middleware::<PgDocumentStore>,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.config().auth_header.clone(),
            middleware::identity_middleware,
        ))
        .layer(session_layer)
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderName, Request};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{DEFAULT_AUTH_HEADER, SentryConfig, StorefrontConfig};

    /// State over a pool that never connects; only routes that stay off the
    /// database can be exercised.
    fn offline_state() -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/threadline_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            auth_header: HeaderName::from_static(DEFAULT_AUTH_HEADER),
            event_capacity: 8,
            sentry: SentryConfig::default(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/threadline_test")
            .unwrap();
        AppState::new(config, pool)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(offline_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_account_drafts_requires_sign_in() {
        let response = app(offline_state())
            .oneshot(
                Request::get("/account/drafts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
