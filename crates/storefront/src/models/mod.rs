//! Domain models for storefront.
//!
//! - [`guest`] - Guest bag items as captured before sign-in
//! - [`design`] - Catalog designs and admin import input
//! - [`session`] - Session-stored identity and reconciliation marker

pub mod design;
pub mod guest;
pub mod session;

pub use design::DesignInput;
pub use guest::GuestBagItem;
pub use session::{CurrentUser, IdentityGate, keys as session_keys};
