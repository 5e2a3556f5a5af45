//! Threadline Core - Shared types library.
//!
//! This crate provides common types used across all Threadline components:
//! - `storefront` - Public-facing storefront and guest session reconciliation
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, hierarchical document paths, and guest storage keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
