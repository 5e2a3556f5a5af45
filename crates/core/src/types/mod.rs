//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod guest;
pub mod id;
pub mod path;

pub use guest::{GUEST_BAG_KEY, GUEST_WISHLIST_KEY};
pub use id::*;
pub use path::{CollectionPath, DocumentPath, Fields, PathError};
