//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store, signed cookie)
//! 4. Identity (mirror the upstream user header into the session)
//! 5. Reconciliation (merge guest state on sign-in, after the handler,
//!    claimed per session so concurrent requests reconcile once)

pub mod auth;
pub mod reconcile;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_user, identity_middleware, set_current_user,
};
pub use reconcile::{
    HX_TRIGGER, ReconcileClaims, ReconcileState, reconcile_middleware, trigger_bag_updated,
};
pub use session::create_session_layer;
