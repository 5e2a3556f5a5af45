//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Bag (guest session or account drafts)
//! POST /bag                    - Add a draft (triggers bagUpdated)
//! GET  /bag/count              - Bag count badge
//!
//! # Wishlist (guest session or account)
//! GET  /wishlist               - Wishlist contents
//! POST /wishlist/{design_id}   - Toggle a design
//!
//! # Account (requires auth)
//! GET  /account/drafts         - Saved drafts
//!
//! # Auth
//! POST /auth/logout            - Logout action
//! ```

pub mod account;
pub mod auth;
pub mod bag;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the bag routes router.
pub fn bag_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(bag::add))
        .route("/count", get(bag::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/{design_id}", post(wishlist::toggle))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/drafts", get(account::drafts))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/bag", bag_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
