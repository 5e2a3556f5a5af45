//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Design catalog import and administration
//! - `drafts` - Saved drafts for signed-in users
//! - `guest` - Guest bag and wishlist held in the session
//! - `reconcile` - Merging guest state into an account on sign-in
//! - `wishlist` - Wishlist snapshots for signed-in users

pub mod catalog;
pub mod drafts;
pub mod guest;
pub mod reconcile;
pub mod wishlist;

pub use catalog::{CatalogError, CatalogService, ImportSummary, SkipReason, Skipped};
pub use drafts::DraftService;
pub use guest::{GuestBag, GuestList, GuestStateError, GuestWishlist};
pub use reconcile::{
    BagOutcome, ReconcileError, ReconcileReport, SessionReconciler, WishlistOutcome,
};
pub use wishlist::{SaveOutcome, WishlistError, WishlistService};
