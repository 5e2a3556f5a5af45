//! Guest storage key convention.
//!
//! Guest state is written by the storefront's browsing surface and consumed
//! by session reconciliation. Both sides must agree on these keys byte for byte.

/// Key holding the guest's shopping bag, a JSON array of draft objects.
pub const GUEST_BAG_KEY: &str = "guestBagStorageKey";

/// Key holding the guest's wishlist, a JSON array of design id strings.
pub const GUEST_WISHLIST_KEY: &str = "guestWishlistStorageKey";
